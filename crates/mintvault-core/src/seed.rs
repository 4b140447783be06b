//! BIP-39 mnemonic validation and seed derivation.

use std::fmt;

use bip39::{Language, Mnemonic};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CoreError;

/// A 64-byte BIP-39 seed.
///
/// Exists only for the duration of one key-derivation call. Zeroized on
/// drop so the seed does not linger in freed memory.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Seed {
    bytes: [u8; 64],
}

impl Seed {
    /// Create a seed from raw bytes.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self { bytes }
    }

    /// Get the raw seed bytes. Handle with care.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.bytes
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Seed").field("bytes", &"[REDACTED]").finish()
    }
}

/// Derive the 64-byte BIP-39 seed from a mnemonic phrase.
///
/// PBKDF2-HMAC-SHA512 with 2048 iterations, password = the mnemonic
/// sentence, salt = `"mnemonic" + passphrase`, per the BIP-39 spec.
/// Whitespace is normalized and the phrase lowercased before parsing,
/// and the word list and checksum are validated; a malformed phrase is
/// rejected before any key material is produced.
pub fn derive_seed(phrase: &str, passphrase: &str) -> Result<Seed, CoreError> {
    let normalized = phrase
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let m = Mnemonic::parse_in(Language::English, &normalized)
        .map_err(|e| CoreError::InvalidMnemonic(e.to_string()))?;
    Ok(Seed::from_bytes(m.to_seed(passphrase)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHRASE_12: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    /// Trezor BIP-39 vector: all-zero 128-bit entropy, passphrase "TREZOR".
    #[test]
    fn trezor_vector_with_passphrase() {
        let seed = derive_seed(PHRASE_12, "TREZOR").expect("known vector should parse");
        let expected = hex::decode(
            "c55257c360c07c72029aebc1b53c05ed0362ada38ead3e3e9efa3708e53495531f09a6987599d182\
             64c1e1c92f2cf141630c7a3c4ab7c81b2f001698e7463b04",
        )
        .unwrap();
        assert_eq!(seed.as_bytes().as_slice(), expected.as_slice());
    }

    /// Same phrase with an empty passphrase yields the standard empty-salt seed.
    #[test]
    fn empty_passphrase_vector() {
        let seed = derive_seed(PHRASE_12, "").expect("known vector should parse");
        let expected = hex::decode(
            "5eb00bbddcf069084889a8ab9155568165f5c453ccb85e70811aaed6f6da5fc19a5ac40b389cd370\
             d086206dec8aa6c43daea6690f20ad3d8d48b2d2ce9e38e4",
        )
        .unwrap();
        assert_eq!(seed.as_bytes().as_slice(), expected.as_slice());
    }

    #[test]
    fn derivation_is_deterministic() {
        let s1 = derive_seed(PHRASE_12, "").unwrap();
        let s2 = derive_seed(PHRASE_12, "").unwrap();
        assert_eq!(s1.as_bytes(), s2.as_bytes());
    }

    #[test]
    fn passphrase_changes_seed() {
        let s1 = derive_seed(PHRASE_12, "").unwrap();
        let s2 = derive_seed(PHRASE_12, "TREZOR").unwrap();
        assert_ne!(s1.as_bytes(), s2.as_bytes());
    }

    /// Extra spaces and mixed case must normalize to the same seed.
    #[test]
    fn whitespace_and_case_normalization() {
        let messy = PHRASE_12.to_uppercase().replace(' ', "   ");
        let s1 = derive_seed(PHRASE_12, "").unwrap();
        let s2 = derive_seed(&messy, "").unwrap();
        assert_eq!(s1.as_bytes(), s2.as_bytes());
    }

    #[test]
    fn invalid_word_rejected() {
        let result = derive_seed(
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon zzzz",
            "",
        );
        assert!(matches!(result, Err(CoreError::InvalidMnemonic(_))));
    }

    /// Valid words, wrong checksum (12 x "abandon") must be rejected.
    #[test]
    fn bad_checksum_rejected() {
        let phrase = ["abandon"; 12].join(" ");
        let result = derive_seed(&phrase, "");
        assert!(matches!(result, Err(CoreError::InvalidMnemonic(_))));
    }

    #[test]
    fn wrong_word_count_rejected() {
        let result = derive_seed("abandon abandon", "");
        assert!(matches!(result, Err(CoreError::InvalidMnemonic(_))));
    }

    #[test]
    fn seed_debug_hides_bytes() {
        let seed = derive_seed(PHRASE_12, "").unwrap();
        let debug = format!("{seed:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("5eb00b"));
    }
}
