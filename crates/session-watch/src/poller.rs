//! One fetch → diff → notify cycle against explicit poller state.
//!
//! State is never mutated in place: a cycle reads the current [`PollState`]
//! and, when something should be committed, hands back the next one inside
//! its [`CycleOutcome`]. A failed cycle yields an error and no state, so the
//! caller keeps the last committed snapshot and cursor.

use chrono::Local;
use session_types::{
    diff_snapshots, latest_modified, normalize, render_report, ModifiedTimestamp, Snapshot,
};

use crate::error::PollResult;
use crate::notifier::Notifier;
use crate::opus_client::SessionSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollPhase {
    /// No snapshot yet; the next fetch is stored without diffing
    #[default]
    Seeding,
    /// A snapshot exists and every fetch is diffed against it
    Tracking,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollState {
    pub phase: PollPhase,
    pub snapshot: Snapshot,
    pub cursor: Option<ModifiedTimestamp>,
}

impl PollState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Counts of what a notified cycle reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeSummary {
    pub added: usize,
    pub removed: usize,
    pub edited: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// First fetch stored as the baseline
    Seeded { sessions: usize, state: PollState },
    /// The API returned no records
    NoRecords,
    /// Records came back but nothing differs from the snapshot
    NoChanges { sessions: usize },
    /// A report was delivered and the new snapshot committed
    Notified {
        summary: ChangeSummary,
        state: PollState,
    },
}

impl CycleOutcome {
    /// The state to carry into the next cycle, if this one committed any
    pub fn into_state(self) -> Option<PollState> {
        match self {
            CycleOutcome::Seeded { state, .. } | CycleOutcome::Notified { state, .. } => Some(state),
            CycleOutcome::NoRecords | CycleOutcome::NoChanges { .. } => None,
        }
    }
}

pub struct SessionPoller<S, N> {
    source: S,
    notifier: N,
}

impl<S: SessionSource, N: Notifier> SessionPoller<S, N> {
    pub fn new(source: S, notifier: N) -> Self {
        Self { source, notifier }
    }

    pub async fn run_cycle(&self, state: &PollState) -> PollResult<CycleOutcome> {
        match state.phase {
            PollPhase::Seeding => self.seed().await,
            PollPhase::Tracking => self.track(state).await,
        }
    }

    async fn seed(&self) -> PollResult<CycleOutcome> {
        let records = self.source.fetch_sessions(None).await?;
        let snapshot = normalize(records);

        tracing::info!("Seeded baseline with {} sessions", snapshot.len());

        Ok(CycleOutcome::Seeded {
            sessions: snapshot.len(),
            state: PollState {
                phase: PollPhase::Tracking,
                snapshot,
                cursor: None,
            },
        })
    }

    async fn track(&self, state: &PollState) -> PollResult<CycleOutcome> {
        let records = self.source.fetch_sessions(state.cursor.as_ref()).await?;
        if records.is_empty() {
            return Ok(CycleOutcome::NoRecords);
        }

        let snapshot = normalize(records);
        let changes = diff_snapshots(&snapshot, &state.snapshot);
        if changes.is_empty() {
            return Ok(CycleOutcome::NoChanges {
                sessions: snapshot.len(),
            });
        }

        let cursor = latest_modified(snapshot.records())?;
        let report = render_report(&changes, Local::now().naive_local());
        self.notifier.notify(&report).await?;

        Ok(CycleOutcome::Notified {
            summary: ChangeSummary {
                added: changes.added.len(),
                removed: changes.removed.len(),
                edited: changes.edited.len(),
            },
            state: PollState {
                phase: PollPhase::Tracking,
                snapshot,
                // no usable records means nothing newer was seen
                cursor: cursor.or(state.cursor),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PollError;
    use async_trait::async_trait;
    use session_types::{RawSessionRecord, ReportMessage};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays queued responses and records the cursor of each call
    #[derive(Default)]
    struct FakeSource {
        responses: Mutex<VecDeque<PollResult<Vec<RawSessionRecord>>>>,
        cursors: Mutex<Vec<Option<ModifiedTimestamp>>>,
    }

    impl FakeSource {
        fn with(responses: Vec<PollResult<Vec<RawSessionRecord>>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                cursors: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SessionSource for FakeSource {
        async fn fetch_sessions(
            &self,
            cursor: Option<&ModifiedTimestamp>,
        ) -> PollResult<Vec<RawSessionRecord>> {
            self.cursors.lock().unwrap().push(cursor.copied());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    #[derive(Default)]
    struct FakeNotifier {
        sent: Mutex<Vec<ReportMessage>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for FakeNotifier {
        async fn notify(&self, report: &ReportMessage) -> PollResult<()> {
            if self.fail {
                return Err(PollError::send("connection refused"));
            }
            self.sent.lock().unwrap().push(report.clone());
            Ok(())
        }
    }

    fn raw(id: &str, status: &str, modified: &str) -> RawSessionRecord {
        RawSessionRecord {
            session_id: Some(id.to_string()),
            session_name: Some(format!("Session {}", id)),
            session_status: Some(status.to_string()),
            modified_date_time: Some(modified.to_string()),
            ..Default::default()
        }
    }

    fn tracking(records: Vec<RawSessionRecord>, cursor: Option<&str>) -> PollState {
        PollState {
            phase: PollPhase::Tracking,
            snapshot: normalize(records),
            cursor: cursor.map(|c| ModifiedTimestamp::parse(c).unwrap()),
        }
    }

    #[tokio::test]
    async fn test_first_cycle_seeds_without_notifying() {
        let source = FakeSource::with(vec![Ok(vec![
            raw("1", "confirmed", "2019-04-01T10:00:00.000"),
            raw("2", "confirmed", "2019-04-02T10:00:00.000"),
        ])]);
        let poller = SessionPoller::new(source, FakeNotifier::default());

        let outcome = poller.run_cycle(&PollState::new()).await.unwrap();

        let state = match outcome {
            CycleOutcome::Seeded { sessions, state } => {
                assert_eq!(sessions, 2);
                state
            }
            other => panic!("expected Seeded, got {:?}", other),
        };
        assert_eq!(state.phase, PollPhase::Tracking);
        assert_eq!(state.snapshot.len(), 2);
        assert_eq!(state.cursor, None);
        assert!(poller.notifier.sent.lock().unwrap().is_empty());
        assert_eq!(*poller.source.cursors.lock().unwrap(), vec![None]);
    }

    #[tokio::test]
    async fn test_empty_first_fetch_still_seeds() {
        let poller = SessionPoller::new(FakeSource::with(vec![Ok(vec![])]), FakeNotifier::default());

        let state = poller
            .run_cycle(&PollState::new())
            .await
            .unwrap()
            .into_state()
            .unwrap();

        assert_eq!(state.phase, PollPhase::Tracking);
        assert!(state.snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_zero_records_changes_nothing() {
        let poller = SessionPoller::new(FakeSource::with(vec![Ok(vec![])]), FakeNotifier::default());
        let state = tracking(
            vec![raw("1", "confirmed", "2019-04-01T10:00:00.000")],
            Some("2019-04-01T10:00:00.000"),
        );

        let outcome = poller.run_cycle(&state).await.unwrap();

        assert_eq!(outcome, CycleOutcome::NoRecords);
        assert_eq!(outcome.into_state(), None);
        assert!(poller.notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unchanged_sessions_keep_cursor_and_snapshot() {
        let records = vec![raw("1", "confirmed", "2019-04-05T10:00:00.000")];
        let poller = SessionPoller::new(
            FakeSource::with(vec![Ok(records.clone())]),
            FakeNotifier::default(),
        );
        let state = tracking(records, Some("2019-04-01T00:00:00.000"));

        let outcome = poller.run_cycle(&state).await.unwrap();

        assert_eq!(outcome, CycleOutcome::NoChanges { sessions: 1 });
        assert_eq!(outcome.into_state(), None);
        assert!(poller.notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_changes_are_reported_and_committed() {
        let poller = SessionPoller::new(
            FakeSource::with(vec![Ok(vec![
                raw("1", "cancelled", "2019-04-06T09:00:00.000"),
                raw("3", "confirmed", "2019-04-07T12:00:00.000"),
            ])]),
            FakeNotifier::default(),
        );
        let state = tracking(
            vec![
                raw("1", "confirmed", "2019-04-01T10:00:00.000"),
                raw("2", "confirmed", "2019-04-01T11:00:00.000"),
            ],
            Some("2019-04-01T11:00:00.000"),
        );

        let outcome = poller.run_cycle(&state).await.unwrap();

        let next = match outcome {
            CycleOutcome::Notified { summary, state } => {
                assert_eq!(
                    summary,
                    ChangeSummary {
                        added: 1,
                        removed: 1,
                        edited: 1
                    }
                );
                state
            }
            other => panic!("expected Notified, got {:?}", other),
        };

        assert_eq!(
            next.cursor,
            Some(ModifiedTimestamp::parse("2019-04-07T12:00:00.000").unwrap())
        );
        let ids: Vec<&str> = next.snapshot.ids().collect();
        assert_eq!(ids, vec!["1", "3"]);

        let sent = poller.notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].text.contains("Added Sessions (1)"));
        assert!(sent[0].text.contains("Removed Sessions (1)"));
        assert!(sent[0]
            .text
            .contains("field session_status changed from \"confirmed\" to \"cancelled\""));

        let cursors = poller.source.cursors.lock().unwrap();
        assert_eq!(cursors[0], state.cursor);
    }

    #[tokio::test]
    async fn test_send_failure_commits_nothing() {
        let poller = SessionPoller::new(
            FakeSource::with(vec![Ok(vec![raw("9", "confirmed", "2019-04-06T09:00:00.000")])]),
            FakeNotifier {
                fail: true,
                ..Default::default()
            },
        );
        let state = tracking(vec![], None);

        let result = poller.run_cycle(&state).await;

        assert!(matches!(result, Err(PollError::Send(_))));
    }

    #[tokio::test]
    async fn test_bad_timestamp_aborts_before_sending() {
        let poller = SessionPoller::new(
            FakeSource::with(vec![Ok(vec![raw("9", "confirmed", "yesterday")])]),
            FakeNotifier::default(),
        );
        let state = tracking(vec![], None);

        let result = poller.run_cycle(&state).await;

        assert!(matches!(result, Err(PollError::Cursor(_))));
        assert!(poller.notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates() {
        let poller = SessionPoller::new(
            FakeSource::with(vec![Err(PollError::malformed("missing `data`"))]),
            FakeNotifier::default(),
        );

        let result = poller.run_cycle(&tracking(vec![], None)).await;

        tokio_test::assert_err!(result);
    }
}
