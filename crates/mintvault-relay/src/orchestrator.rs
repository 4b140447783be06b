//! End-to-end mint-list backup orchestration.
//!
//! Composes the core crate's derivation, encryption, and signing with the
//! per-endpoint publisher: derive seed → derive keypair → build payload →
//! encrypt → build and sign the event → fan out one task per relay →
//! aggregate. A derivation or encryption failure aborts before any
//! network I/O; per-endpoint failures are collected, never raised.

use std::time::{SystemTime, UNIX_EPOCH};

use mintvault_core::{
    derive_seed, nip44, BackupKeypair, Event, MintListPayload, IDENTITY_TAG_VALUE,
    MINT_BACKUP_KIND,
};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::config::BackupConfig;
use crate::error::BackupError;
use crate::publisher::{self, RelayOutcome};

/// Aggregated result of one backup attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupReport {
    /// True iff at least one relay accepted the event.
    pub success: bool,
    /// The published event's id, hex.
    pub event_id: String,
    /// Endpoints that acknowledged the event.
    pub succeeded: Vec<String>,
    /// Endpoints that did not, each with its reason.
    pub failed: Vec<RelayOutcome>,
}

/// The backup engine: explicit configuration in, one report out.
///
/// Holds no key material and no connections between calls; every
/// [`publish_mint_backup`](Self::publish_mint_backup) call derives, uses,
/// and discards its own keys.
#[derive(Debug, Clone)]
pub struct MintBackup {
    config: BackupConfig,
}

impl MintBackup {
    /// Create an engine with the given configuration.
    pub fn new(config: BackupConfig) -> Self {
        Self { config }
    }

    /// Create an engine with the default relays and timeouts.
    pub fn with_defaults() -> Self {
        Self::new(BackupConfig::default())
    }

    /// Back up `mints` as an encrypted, signed event published to every
    /// configured relay, stamped with the current time.
    ///
    /// Returns `Err` only for failures that occur before any network
    /// call (bad mnemonic, degenerate key, encryption failure). Relay
    /// failures land in the report; `success` is false when no relay
    /// accepted, and the caller decides whether to retry.
    pub async fn publish_mint_backup(
        &self,
        mnemonic: &str,
        mints: &[String],
    ) -> Result<BackupReport, BackupError> {
        self.publish_mint_backup_at(mnemonic, mints, unix_now()).await
    }

    /// [`publish_mint_backup`](Self::publish_mint_backup) with an
    /// explicit timestamp, for deterministic callers and tests.
    pub async fn publish_mint_backup_at(
        &self,
        mnemonic: &str,
        mints: &[String],
        timestamp: u64,
    ) -> Result<BackupReport, BackupError> {
        let event = self.build_event(mnemonic, mints, timestamp)?;
        info!(
            event_id = %event.id,
            mints = mints.len(),
            relays = self.config.relays.len(),
            "publishing mint-list backup"
        );

        let outcomes = self.fan_out(&event).await;
        let report = aggregate(event.id.clone(), outcomes);

        info!(
            event_id = %report.event_id,
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "mint backup complete"
        );
        for outcome in &report.failed {
            warn!(
                endpoint = %outcome.endpoint,
                reason = outcome.reason.as_deref().unwrap_or("unknown"),
                "relay did not accept backup"
            );
        }
        Ok(report)
    }

    /// Derive keys, encrypt the payload, and sign the event. Everything
    /// that can abort a backup happens here, before any connection is
    /// opened; the seed and keypair are dropped (and zeroized) before
    /// this function returns.
    fn build_event(
        &self,
        mnemonic: &str,
        mints: &[String],
        timestamp: u64,
    ) -> Result<Event, BackupError> {
        let keypair = {
            let seed = derive_seed(mnemonic, "")?;
            BackupKeypair::derive(&seed)?
        };

        let payload = MintListPayload {
            mints: mints.to_vec(),
            timestamp,
        };
        let plaintext = serde_json::to_string(&payload)
            .map_err(|e| BackupError::Serialization(e.to_string()))?;

        let key = nip44::conversation_key(keypair.secret_bytes(), keypair.public_key())?;
        let content = nip44::encrypt(&plaintext, &key)?;

        let tags = vec![
            vec!["d".to_string(), IDENTITY_TAG_VALUE.to_string()],
            vec!["client".to_string(), self.config.client_tag.clone()],
        ];
        Ok(Event::signed(
            &keypair,
            timestamp,
            MINT_BACKUP_KIND,
            tags,
            content,
        )?)
    }

    /// One task per endpoint, each returning its own outcome. The wait
    /// is bounded by the overall timeout; tasks still running at the
    /// deadline are aborted and their endpoints recorded as unanswered.
    async fn fan_out(&self, event: &Event) -> Vec<RelayOutcome> {
        let mut tasks = JoinSet::new();
        for relay in &self.config.relays {
            let endpoint = relay.clone();
            let event = event.clone();
            let timeout = self.config.publish_timeout;
            tasks.spawn(async move { publisher::publish(&endpoint, &event, timeout).await });
        }

        let deadline = tokio::time::Instant::now() + self.config.overall_timeout;
        let mut outcomes = Vec::with_capacity(self.config.relays.len());
        while !tasks.is_empty() {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok(outcome))) => outcomes.push(outcome),
                Ok(Some(Err(e))) => warn!(error = %e, "publish task failed"),
                Ok(None) => break,
                Err(_) => {
                    tasks.abort_all();
                    break;
                }
            }
        }

        for relay in &self.config.relays {
            if !outcomes.iter().any(|o| o.endpoint == *relay) {
                outcomes.push(RelayOutcome::rejected(
                    relay,
                    "no acknowledgment before overall timeout",
                ));
            }
        }
        outcomes
    }
}

fn aggregate(event_id: String, outcomes: Vec<RelayOutcome>) -> BackupReport {
    let (accepted, failed): (Vec<_>, Vec<_>) = outcomes.into_iter().partition(|o| o.accepted);
    BackupReport {
        success: !accepted.is_empty(),
        event_id,
        succeeded: accepted.into_iter().map(|o| o.endpoint).collect(),
        failed,
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
