//! # mintvault-core — backup cryptography and event codec.
//!
//! Everything needed to turn a wallet mnemonic and a mint list into a
//! signed, encrypted, publishable Nostr event: BIP-39 seed derivation,
//! domain-separated secp256k1 key derivation, BIP-340 Schnorr signing,
//! NIP-44 v2 payload encryption, and canonical event-id computation.
//!
//! This crate is pure computation — no networking, no persistence. The
//! relay protocol lives in `mintvault-relay`.
//!
//! # Modules
//!
//! - [`error`] — `CoreError` enum
//! - [`seed`] — mnemonic validation, BIP-39 seed derivation
//! - [`keys`] — deterministic backup keypair
//! - [`schnorr`] — BIP-340 signatures over secp256k1
//! - [`nip44`] — NIP-44 v2 encryption
//! - [`event`] — event construction, canonical ids, signing

pub mod error;
pub mod event;
pub mod keys;
pub mod nip44;
pub mod schnorr;
pub mod seed;

// Re-exports for convenient access
pub use error::CoreError;
pub use event::{Event, MintListPayload, IDENTITY_TAG_VALUE, MINT_BACKUP_KIND};
pub use keys::BackupKeypair;
pub use seed::{derive_seed, Seed};
