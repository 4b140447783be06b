//! Backup error types.

use mintvault_core::CoreError;
use thiserror::Error;

/// Errors that abort a backup before any relay is contacted.
///
/// Per-endpoint failures are not errors: they are recorded as
/// [`RelayOutcome`](crate::publisher::RelayOutcome) values inside the
/// report so the caller sees every endpoint's fate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackupError {
    /// Key derivation, encryption, or signing failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The event could not be serialized for the wire.
    #[error("event serialization: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_error_converts() {
        let err: BackupError = CoreError::InvalidScalar.into();
        assert_eq!(err, BackupError::Core(CoreError::InvalidScalar));
    }

    #[test]
    fn display_passes_through_core() {
        let err: BackupError = CoreError::InvalidMnemonic("too short".into()).into();
        assert_eq!(err.to_string(), "invalid mnemonic: too short");
    }
}
