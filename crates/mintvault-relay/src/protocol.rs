//! Relay wire protocol frames (NIP-01 subset).
//!
//! Publishing needs exactly three frame shapes: the outgoing
//! `["EVENT", {…}]` and the incoming `["OK", id, bool, message]` and
//! `["NOTICE", message]`. Everything else a relay might send is ignored.

use mintvault_core::Event;
use serde_json::Value;

use crate::error::BackupError;

/// Frames a relay can send while we wait for an acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayMessage {
    /// `["OK", event_id, accepted, message]` — the acknowledgment.
    Ok {
        event_id: String,
        accepted: bool,
        message: String,
    },
    /// `["NOTICE", message]` — informational, not terminal.
    Notice(String),
    /// Anything unrecognized or malformed; ignored, keep waiting.
    Other,
}

/// Encode the publish frame `["EVENT", {…}]`.
pub fn event_frame(event: &Event) -> Result<String, BackupError> {
    serde_json::to_string(&("EVENT", event)).map_err(|e| BackupError::Serialization(e.to_string()))
}

impl RelayMessage {
    /// Parse an incoming text frame. Malformed or unknown frames come
    /// back as [`RelayMessage::Other`] so the read loop can skip them.
    pub fn parse(text: &str) -> Self {
        let Ok(Value::Array(items)) = serde_json::from_str::<Value>(text) else {
            return Self::Other;
        };
        match items.first().and_then(Value::as_str) {
            Some("OK") => {
                let (Some(event_id), Some(accepted)) = (
                    items.get(1).and_then(Value::as_str),
                    items.get(2).and_then(Value::as_bool),
                ) else {
                    return Self::Other;
                };
                let message = items
                    .get(3)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                Self::Ok {
                    event_id: event_id.to_string(),
                    accepted,
                    message,
                }
            }
            Some("NOTICE") => match items.get(1).and_then(Value::as_str) {
                Some(message) => Self::Notice(message.to_string()),
                None => Self::Other,
            },
            _ => Self::Other,
        }
    }
}
