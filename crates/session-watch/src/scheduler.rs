use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};

use crate::notifier::Notifier;
use crate::opus_client::SessionSource;
use crate::poller::{CycleOutcome, PollState, SessionPoller};

/// Owns the poller state and drives cycles one at a time.
///
/// The state lives inside the loop, so a cycle can only start after the
/// previous one has finished and committed (or discarded) its result.
pub struct PollingScheduler<S, N> {
    poller: SessionPoller<S, N>,
    interval: Duration,
    failure_alert_threshold: u32,
    state: PollState,
    consecutive_failures: u32,
}

impl<S: SessionSource, N: Notifier> PollingScheduler<S, N> {
    pub fn new(poller: SessionPoller<S, N>, interval: Duration, failure_alert_threshold: u32) -> Self {
        Self {
            poller,
            interval,
            failure_alert_threshold,
            state: PollState::new(),
            consecutive_failures: 0,
        }
    }

    pub fn state(&self) -> &PollState {
        &self.state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Poll forever at the configured interval
    pub async fn run(&mut self) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!("Session poller started (interval: {:?})", self.interval);

        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }

    /// Run a single cycle, commit its state and log the outcome.
    /// Returns whether the cycle succeeded.
    pub async fn tick(&mut self) -> bool {
        tracing::debug!("Running session poll cycle");

        match self.poller.run_cycle(&self.state).await {
            Ok(outcome) => {
                log_outcome(&outcome);
                if let Some(next) = outcome.into_state() {
                    self.state = next;
                }
                self.consecutive_failures = 0;
                true
            }
            Err(e) => {
                self.consecutive_failures += 1;
                if self.consecutive_failures >= self.failure_alert_threshold {
                    tracing::warn!(
                        "Session polling has failed {} cycles in a row: {}",
                        self.consecutive_failures,
                        e
                    );
                } else {
                    tracing::error!("Session poll cycle failed: {}", e);
                }
                false
            }
        }
    }
}

fn log_outcome(outcome: &CycleOutcome) {
    match outcome {
        CycleOutcome::Seeded { sessions, .. } => {
            tracing::info!("Initial pull stored {} sessions", sessions)
        }
        CycleOutcome::NoRecords => tracing::info!("No session changes..."),
        CycleOutcome::NoChanges { sessions } => {
            tracing::info!("Fetched {} sessions, nothing changed", sessions)
        }
        CycleOutcome::Notified { summary, state } => tracing::info!(
            "Reported {} added, {} removed, {} edited; cursor now {:?}",
            summary.added,
            summary.removed,
            summary.edited,
            state.cursor.map(|c| c.to_string())
        ),
    }
}
