//! Backup publishing configuration.

use std::time::Duration;

/// Public relays that hold mint-list backups by default.
pub const DEFAULT_RELAYS: [&str; 4] = [
    "wss://relay.primal.net",
    "wss://relay.damus.io",
    "wss://nos.lol",
    "wss://nostr.mom",
];

/// Client identifier placed in the event's `client` tag.
pub const DEFAULT_CLIENT_TAG: &str = "numo";

/// Configuration for the backup orchestrator.
#[derive(Debug, Clone)]
pub struct BackupConfig {
    /// Relay endpoints to publish to. Each gets its own connection.
    pub relays: Vec<String>,
    /// How long a single endpoint may take from connect to acknowledgment.
    pub publish_timeout: Duration,
    /// Upper bound on the whole fan-out; stragglers are recorded as
    /// timed out and their tasks cancelled.
    pub overall_timeout: Duration,
    /// Value of the `client` tag on published events.
    pub client_tag: String,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            relays: DEFAULT_RELAYS.iter().map(|s| s.to_string()).collect(),
            publish_timeout: Duration::from_secs(30),
            overall_timeout: Duration::from_secs(30),
            client_tag: DEFAULT_CLIENT_TAG.to_string(),
        }
    }
}

impl BackupConfig {
    /// Configuration with a custom relay set and default timeouts.
    pub fn with_relays(relays: Vec<String>) -> Self {
        Self {
            relays,
            ..Self::default()
        }
    }
}
