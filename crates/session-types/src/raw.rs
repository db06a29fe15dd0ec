//! Typed view of a session entry as returned by the session API.
//!
//! Every field is optional. Strings pass through, numbers and booleans are
//! rendered to text, `null` becomes `None` and unknown fields are ignored,
//! so payload drift never fails a whole response.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSessionRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub session_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub group_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub session_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub session_start_date_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub session_end_date_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub room_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub session_status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub modified_date_time: Option<String>,
}

impl RawSessionRecord {
    /// Convert untyped payload entries, dropping any that are not objects
    pub fn from_values(values: Vec<Value>) -> Vec<Self> {
        values
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| {
                // serde would map an array onto the fields by position
                if !value.is_object() {
                    tracing::warn!("Dropping malformed session entry #{}: not an object", index);
                    return None;
                }
                match serde_json::from_value(value) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        tracing::warn!("Dropping malformed session entry #{}: {}", index, e);
                        None
                    }
                }
            })
            .collect()
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => Some(other.to_string()),
    })
}
