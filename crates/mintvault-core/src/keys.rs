//! Deterministic backup keypair derivation.
//!
//! The backup identity is a secp256k1 keypair derived from the wallet
//! seed and a fixed domain separator, so the same mnemonic always
//! recovers the same identity and keys derived for other purposes from
//! the same seed stay unrelated.

use std::fmt;

use k256::elliptic_curve::point::AffineCoordinates;
use k256::ProjectivePoint;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CoreError;
use crate::schnorr;
use crate::seed::Seed;

/// Domain separator mixed into the private-key hash. Protocol constant:
/// changing it orphans every previously published backup.
const DOMAIN_SEPARATOR: &[u8] = b"cashu-mint-backup";

/// The secp256k1 keypair dedicated to mint-list backups.
///
/// `private scalar = SHA-256(seed || "cashu-mint-backup")`, public key is
/// the 32-byte x-only encoding of `d*G` (BIP-340 convention: the signer
/// picks the even-y form of the point at signing time). Must not outlive
/// the backup operation that derived it; the secret is zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct BackupKeypair {
    secret: [u8; 32],
    public_x: [u8; 32],
}

impl BackupKeypair {
    /// Derive the backup keypair from a BIP-39 seed.
    ///
    /// Fails if the hash lands on zero or outside the curve order
    /// rather than producing a degenerate keypair.
    pub fn derive(seed: &Seed) -> Result<Self, CoreError> {
        let mut hasher = Sha256::new();
        hasher.update(seed.as_bytes());
        hasher.update(DOMAIN_SEPARATOR);
        let secret: [u8; 32] = hasher.finalize().into();

        let d = schnorr::parse_scalar(&secret)?;
        let public = (ProjectivePoint::GENERATOR * d).to_affine();
        let public_x: [u8; 32] = public.x().into();

        tracing::debug!(pubkey = %hex::encode(public_x), "derived backup keypair");
        Ok(Self { secret, public_x })
    }

    /// The raw private scalar, big-endian. Handle with care.
    pub fn secret_bytes(&self) -> &[u8; 32] {
        &self.secret
    }

    /// The x-only public key.
    pub fn public_key(&self) -> &[u8; 32] {
        &self.public_x
    }

    /// The x-only public key as lowercase hex, as it appears in events.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_x)
    }
}

impl fmt::Debug for BackupKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackupKeypair")
            .field("secret", &"[REDACTED]")
            .field("public_x", &self.public_key_hex())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::derive_seed;

    const PHRASE_12: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    /// Fixed mnemonic, empty passphrase: the derived scalar and x-only
    /// public key must never change. Recovery of published backups
    /// depends on this exact derivation.
    #[test]
    fn golden_keypair_vector() {
        let seed = derive_seed(PHRASE_12, "").unwrap();
        let kp = BackupKeypair::derive(&seed).unwrap();
        assert_eq!(
            hex::encode(kp.secret_bytes()),
            "a2b87a529208651bbf974186ee4a0c13c1f31e07030de6ebd09ee33559ff97a7"
        );
        assert_eq!(
            kp.public_key_hex(),
            "e1c971f6a291628471291a266ab85c6ffd7116c7aab6299a6801ae502f56d69b"
        );
    }

    #[test]
    fn derivation_is_deterministic() {
        let seed = derive_seed(PHRASE_12, "").unwrap();
        let kp1 = BackupKeypair::derive(&seed).unwrap();
        let kp2 = BackupKeypair::derive(&seed).unwrap();
        assert_eq!(kp1.secret_bytes(), kp2.secret_bytes());
        assert_eq!(kp1.public_key(), kp2.public_key());
    }

    #[test]
    fn different_seeds_give_different_keys() {
        let s1 = derive_seed(PHRASE_12, "").unwrap();
        let s2 = derive_seed(PHRASE_12, "TREZOR").unwrap();
        let kp1 = BackupKeypair::derive(&s1).unwrap();
        let kp2 = BackupKeypair::derive(&s2).unwrap();
        assert_ne!(kp1.public_key(), kp2.public_key());
    }

    #[test]
    fn debug_hides_secret() {
        let seed = derive_seed(PHRASE_12, "").unwrap();
        let kp = BackupKeypair::derive(&seed).unwrap();
        let debug = format!("{kp:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("a2b87a52"));
        assert!(debug.contains("e1c971f6"));
    }
}
