//! Errors that abort a poll cycle.
//!
//! Any of these leaves the poller state untouched; the next scheduled cycle
//! retries from the last committed snapshot and cursor.

use session_types::CursorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PollError {
    /// Transport, timeout, auth or non-2xx failure talking to the session API
    #[error("Session fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// The API answered but not in the `{ data: { result: [...] } }` shape
    #[error("Malformed session API response: {0}")]
    MalformedResponse(String),

    /// A fetched session carried a missing or malformed modification time
    #[error(transparent)]
    Cursor(#[from] CursorError),

    /// Mail could not be built or delivered
    #[error("Notification failed: {0}")]
    Send(String),

    /// Configured sender or recipient is not a valid mailbox
    #[error("Invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),
}

impl PollError {
    pub fn malformed(message: impl Into<String>) -> Self {
        PollError::MalformedResponse(message.into())
    }

    pub fn send(err: impl std::fmt::Display) -> Self {
        PollError::Send(err.to_string())
    }
}

pub type PollResult<T> = Result<T, PollError>;
