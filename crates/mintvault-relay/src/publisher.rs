//! Single-endpoint publish-and-acknowledge.
//!
//! Each call owns one transient WebSocket connection and walks a small
//! state machine: connect → send `["EVENT", …]` → wait for the matching
//! `OK` → close. Whatever happens — acceptance, rejection, connection
//! failure, timeout — comes back as a single [`RelayOutcome`] value, so
//! one endpoint can never block or corrupt another's result.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use mintvault_core::Event;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::protocol::{self, RelayMessage};

/// The fate of one backup event at one relay endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOutcome {
    /// The relay this outcome belongs to.
    pub endpoint: String,
    /// Whether the relay acknowledged the event with `OK … true`.
    pub accepted: bool,
    /// Failure detail when not accepted.
    pub reason: Option<String>,
}

impl RelayOutcome {
    pub(crate) fn accepted(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            accepted: true,
            reason: None,
        }
    }

    pub(crate) fn rejected(endpoint: &str, reason: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            accepted: false,
            reason: Some(reason.into()),
        }
    }
}

/// Publish one signed event to one relay, bounded by `timeout`.
///
/// The timeout covers the whole exchange, connect included. Never
/// returns an error: every failure mode is folded into the outcome.
pub async fn publish(endpoint: &str, event: &Event, timeout: Duration) -> RelayOutcome {
    match tokio::time::timeout(timeout, publish_inner(endpoint, event)).await {
        Ok(outcome) => outcome,
        Err(_) => RelayOutcome::rejected(
            endpoint,
            format!("no acknowledgment within {}s", timeout.as_secs()),
        ),
    }
}

async fn publish_inner(endpoint: &str, event: &Event) -> RelayOutcome {
    let frame = match protocol::event_frame(event) {
        Ok(frame) => frame,
        Err(e) => return RelayOutcome::rejected(endpoint, e.to_string()),
    };

    let (mut ws, _) = match connect_async(endpoint).await {
        Ok(conn) => conn,
        Err(e) => return RelayOutcome::rejected(endpoint, format!("connect failed: {e}")),
    };
    debug!(%endpoint, "connected, sending event");

    if let Err(e) = ws.send(Message::Text(frame.into())).await {
        return RelayOutcome::rejected(endpoint, format!("send failed: {e}"));
    }

    let outcome = loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => match RelayMessage::parse(text.as_str()) {
                RelayMessage::Ok {
                    event_id,
                    accepted,
                    message,
                } => {
                    if event_id != event.id {
                        debug!(%endpoint, %event_id, "OK for a different event, still waiting");
                        continue;
                    }
                    if accepted {
                        info!(%endpoint, event_id = %event.id, "relay accepted backup event");
                        break RelayOutcome::accepted(endpoint);
                    }
                    break RelayOutcome::rejected(
                        endpoint,
                        format!("relay rejected event: {message}"),
                    );
                }
                RelayMessage::Notice(message) => {
                    warn!(%endpoint, %message, "relay notice");
                }
                RelayMessage::Other => {}
            },
            Some(Ok(Message::Ping(data))) => {
                if ws.send(Message::Pong(data)).await.is_err() {
                    break RelayOutcome::rejected(endpoint, "connection lost during ping");
                }
            }
            Some(Ok(Message::Close(_))) | None => {
                break RelayOutcome::rejected(endpoint, "connection closed before acknowledgment");
            }
            Some(Err(e)) => {
                break RelayOutcome::rejected(endpoint, format!("connection error: {e}"));
            }
            Some(Ok(_)) => {}
        }
    };

    let _ = ws.close(None).await;
    outcome
}
