//! Core error types.

use thiserror::Error;

/// Errors from key derivation, signing, and encryption.
///
/// Every variant here is fatal for the backup attempt that raised it:
/// nothing may be sent to a relay once derivation or encryption has
/// failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Invalid BIP-39 mnemonic phrase.
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// Derived private key is zero or not a canonical scalar.
    #[error("derived key is not a valid curve scalar")]
    InvalidScalar,

    /// A 32-byte value is not the x-coordinate of a curve point.
    #[error("invalid x-only public key")]
    InvalidPublicKey,

    /// Deterministic nonce derivation produced zero.
    ///
    /// Signing retries with fresh auxiliary randomness; seeing this
    /// escape means the retries were exhausted.
    #[error("signature nonce derivation failed")]
    ZeroNonce,

    /// Encryption failure.
    #[error("encryption: {0}")]
    Encryption(String),

    /// Decryption failure.
    #[error("decryption: {0}")]
    Decryption(String),

    /// A freshly signed event failed its own verification.
    #[error("signed event failed self-verification")]
    SelfCheckFailed,

    /// Serialization error.
    #[error("serialization: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_mnemonic() {
        let e = CoreError::InvalidMnemonic("word count 3".into());
        assert_eq!(e.to_string(), "invalid mnemonic: word count 3");
    }

    #[test]
    fn display_invalid_scalar() {
        let e = CoreError::InvalidScalar;
        assert_eq!(e.to_string(), "derived key is not a valid curve scalar");
    }

    #[test]
    fn clone_and_eq() {
        let e1 = CoreError::Encryption("short key".into());
        let e2 = e1.clone();
        assert_eq!(e1, e2);
    }
}
