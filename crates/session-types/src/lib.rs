//! Session model and change detection for the Opus session watcher.
//!
//! Everything in this crate is pure: raw API entries go in, snapshots,
//! change sets, cursors and rendered reports come out.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod cursor;
pub mod diff;
pub mod normalize;
pub mod raw;
pub mod report;
pub mod timestamp;

pub use cursor::{latest_modified, CursorError};
pub use diff::diff_snapshots;
pub use normalize::normalize;
pub use raw::RawSessionRecord;
pub use report::{render_report, ReportMessage};
pub use timestamp::ModifiedTimestamp;

/// One observed session, reduced to the fields we track
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub group_name: String,
    pub session_name: String,
    pub session_start_date_time: String,
    pub session_end_date_time: String,
    pub room_name: String,
    pub session_status: String,
    pub modified_date_time: String,
}

/// Session attributes compared between snapshots, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparableField {
    GroupName,
    SessionName,
    SessionStartDateTime,
    SessionEndDateTime,
    RoomName,
    SessionStatus,
}

impl ComparableField {
    pub const ALL: [ComparableField; 6] = [
        ComparableField::GroupName,
        ComparableField::SessionName,
        ComparableField::SessionStartDateTime,
        ComparableField::SessionEndDateTime,
        ComparableField::RoomName,
        ComparableField::SessionStatus,
    ];

    /// Field name as it appears in the API payload
    pub fn name(&self) -> &'static str {
        match self {
            ComparableField::GroupName => "group_name",
            ComparableField::SessionName => "session_name",
            ComparableField::SessionStartDateTime => "session_start_date_time",
            ComparableField::SessionEndDateTime => "session_end_date_time",
            ComparableField::RoomName => "room_name",
            ComparableField::SessionStatus => "session_status",
        }
    }

    /// Read this field from a record
    pub fn value<'a>(&self, record: &'a SessionRecord) -> &'a str {
        match self {
            ComparableField::GroupName => &record.group_name,
            ComparableField::SessionName => &record.session_name,
            ComparableField::SessionStartDateTime => &record.session_start_date_time,
            ComparableField::SessionEndDateTime => &record.session_end_date_time,
            ComparableField::RoomName => &record.room_name,
            ComparableField::SessionStatus => &record.session_status,
        }
    }
}

impl std::fmt::Display for ComparableField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// All known sessions at one point in time, keyed by session id.
///
/// Backed by a `BTreeMap` so iteration (and everything derived from it) is
/// in ascending id order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    sessions: BTreeMap<String, SessionRecord>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record under its own id, replacing any previous entry
    pub fn insert(&mut self, record: SessionRecord) -> Option<SessionRecord> {
        self.sessions.insert(record.session_id.clone(), record)
    }

    pub fn get(&self, session_id: &str) -> Option<&SessionRecord> {
        self.sessions.get(session_id)
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.sessions.keys().map(String::as_str)
    }

    pub fn records(&self) -> impl Iterator<Item = &SessionRecord> {
        self.sessions.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SessionRecord)> {
        self.sessions.iter().map(|(id, record)| (id.as_str(), record))
    }
}

impl FromIterator<SessionRecord> for Snapshot {
    fn from_iter<I: IntoIterator<Item = SessionRecord>>(iter: I) -> Self {
        let mut snapshot = Snapshot::new();
        for record in iter {
            snapshot.insert(record);
        }
        snapshot
    }
}

/// A single changed field on a session present in both snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldEdit {
    pub session_id: String,
    pub field: ComparableField,
    pub previous_value: String,
    pub current_value: String,
}

/// Differences between two snapshots
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub added: Vec<SessionRecord>,
    pub removed: Vec<SessionRecord>,
    pub edited: Vec<FieldEdit>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.edited.is_empty()
    }

    /// Total number of reported changes across all three lists
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.edited.len()
    }
}
