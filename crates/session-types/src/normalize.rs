use crate::{RawSessionRecord, SessionRecord, Snapshot};

/// Build a snapshot from raw API entries.
///
/// Entries without a non-empty `session_id` are skipped. Only the tracked
/// fields are kept; missing ones default to the empty string. A later entry
/// with the same id replaces an earlier one.
pub fn normalize<I>(records: I) -> Snapshot
where
    I: IntoIterator<Item = RawSessionRecord>,
{
    let mut snapshot = Snapshot::new();

    for raw in records {
        let session_id = match raw.session_id {
            Some(id) if !id.is_empty() => id,
            _ => {
                tracing::debug!(
                    "Skipping session entry without session_id (name: {:?})",
                    raw.session_name
                );
                continue;
            }
        };

        snapshot.insert(SessionRecord {
            session_id,
            group_name: raw.group_name.unwrap_or_default(),
            session_name: raw.session_name.unwrap_or_default(),
            session_start_date_time: raw.session_start_date_time.unwrap_or_default(),
            session_end_date_time: raw.session_end_date_time.unwrap_or_default(),
            room_name: raw.room_name.unwrap_or_default(),
            session_status: raw.session_status.unwrap_or_default(),
            modified_date_time: raw.modified_date_time.unwrap_or_default(),
        });
    }

    snapshot
}
