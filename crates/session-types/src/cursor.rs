use crate::{ModifiedTimestamp, SessionRecord};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CursorError {
    #[error("session {session_id} has no modified_date_time")]
    Missing { session_id: String },

    #[error("session {session_id} has unparseable modified_date_time {value:?}: {source}")]
    Unparseable {
        session_id: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Find the latest `modified_date_time` among `records`.
///
/// Returns `Ok(None)` for an empty input. Any record whose timestamp is
/// missing or malformed fails the whole calculation, since skipping it could
/// leave the cursor behind a change we already reported.
pub fn latest_modified<'a, I>(records: I) -> Result<Option<ModifiedTimestamp>, CursorError>
where
    I: IntoIterator<Item = &'a SessionRecord>,
{
    let mut latest: Option<ModifiedTimestamp> = None;

    for record in records {
        if record.modified_date_time.trim().is_empty() {
            return Err(CursorError::Missing {
                session_id: record.session_id.clone(),
            });
        }

        let ts = ModifiedTimestamp::parse(&record.modified_date_time).map_err(|source| {
            CursorError::Unparseable {
                session_id: record.session_id.clone(),
                value: record.modified_date_time.clone(),
                source,
            }
        })?;

        match latest {
            Some(current) if ts <= current => {}
            _ => latest = Some(ts),
        }
    }

    Ok(latest)
}
