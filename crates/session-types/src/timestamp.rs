//! Parsed modification timestamps.
//!
//! The session API reports `modified_date_time` as `YYYY-MM-DDTHH:mm:ss.SSS`
//! with no zone, and accepts filters as `MM/DD/YYYY HH:mm:ss`. Both are
//! treated as the API's local wall-clock time, so a naive datetime is enough.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Format of `modified_date_time` as received from the API
pub const SOURCE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Format used in the outbound `filter` expression
pub const FILTER_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModifiedTimestamp(NaiveDateTime);

impl ModifiedTimestamp {
    /// Parse a `modified_date_time` value as sent by the API
    pub fn parse(value: &str) -> Result<Self, chrono::ParseError> {
        NaiveDateTime::parse_from_str(value.trim(), SOURCE_FORMAT).map(Self)
    }

    /// Parse a timestamp written in filter format (used by the CLI)
    pub fn parse_filter(value: &str) -> Result<Self, chrono::ParseError> {
        NaiveDateTime::parse_from_str(value.trim(), FILTER_FORMAT).map(Self)
    }

    /// Render for the request filter, e.g. `03/01/2019 12:30:45`
    pub fn to_filter_string(&self) -> String {
        self.0.format(FILTER_FORMAT).to_string()
    }

    /// The full `modified_date_time > ...` expression sent to the API
    pub fn filter_expression(&self) -> String {
        format!("modified_date_time > {}", self.to_filter_string())
    }
}

impl fmt::Display for ModifiedTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(SOURCE_FORMAT))
    }
}
