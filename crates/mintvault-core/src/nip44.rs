//! NIP-44 v2 payload encryption.
//!
//! Authenticated encryption keyed by an ECDH-derived conversation key:
//! HKDF-SHA256 for the key schedule, ChaCha20 for the stream cipher,
//! HMAC-SHA256 over `nonce || ciphertext` for authentication, and a
//! power-of-two padding scheme that hides the plaintext length. The
//! backup flow uses it in self-encryption mode — the conversation key is
//! derived between the backup key and its own public key, so the same
//! mnemonic that produced the backup can decrypt it later.
//!
//! # Payload format
//! ```text
//! base64( version (1 byte, 0x02) || nonce (32) || ciphertext || mac (32) )
//! ```

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::{ChaCha20, Key, Nonce};
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use k256::elliptic_curve::point::AffineCoordinates;
use k256::ProjectivePoint;
use rand::RngCore;
use sha2::Sha256;

use crate::error::CoreError;
use crate::schnorr::{lift_x, parse_scalar};

type HmacSha256 = Hmac<Sha256>;

/// HKDF-Extract salt fixed by the NIP-44 v2 spec.
const SALT: &[u8] = b"nip44-v2";

const VERSION: u8 = 2;
const NONCE_LEN: usize = 32;
const MAC_LEN: usize = 32;
/// ChaCha key (32) + ChaCha nonce (12) + HMAC key (32).
const OKM_LEN: usize = 76;
/// version + nonce + minimum padded block (2 + 32) + mac.
const MIN_PAYLOAD_LEN: usize = 1 + NONCE_LEN + 34 + MAC_LEN;

const MAX_PLAINTEXT_LEN: usize = 65535;

/// Derive the 32-byte conversation key between a private scalar and an
/// x-only public key.
///
/// `conversation_key = HKDF-Extract(salt = "nip44-v2", IKM = shared_x)`
/// where `shared_x` is the x-coordinate of `d * P` and `P` is the even-y
/// lift of the public key.
pub fn conversation_key(secret: &[u8; 32], public_x: &[u8; 32]) -> Result<[u8; 32], CoreError> {
    let d = parse_scalar(secret)?;
    let p = lift_x(public_x).ok_or(CoreError::InvalidPublicKey)?;
    let shared = (ProjectivePoint::from(p) * d).to_affine();
    let shared_x: [u8; 32] = shared.x().into();

    let (prk, _) = Hkdf::<Sha256>::extract(Some(SALT), &shared_x);
    Ok(prk.into())
}

/// Encrypt a plaintext string, returning the base64 payload.
pub fn encrypt(plaintext: &str, key: &[u8; 32]) -> Result<String, CoreError> {
    let mut nonce = [0u8; NONCE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    encrypt_with_nonce(plaintext, key, &nonce)
}

fn encrypt_with_nonce(
    plaintext: &str,
    key: &[u8; 32],
    nonce: &[u8; NONCE_LEN],
) -> Result<String, CoreError> {
    let mut buf = pad(plaintext.as_bytes())?;
    let (chacha_key, chacha_nonce, hmac_key) = message_keys(key, nonce)?;

    let mut cipher = ChaCha20::new(Key::from_slice(&chacha_key), Nonce::from_slice(&chacha_nonce));
    cipher.apply_keystream(&mut buf);

    let mut mac = HmacSha256::new_from_slice(&hmac_key)
        .map_err(|e| CoreError::Encryption(e.to_string()))?;
    mac.update(nonce);
    mac.update(&buf);
    let tag = mac.finalize().into_bytes();

    let mut payload = Vec::with_capacity(1 + NONCE_LEN + buf.len() + MAC_LEN);
    payload.push(VERSION);
    payload.extend_from_slice(nonce);
    payload.extend_from_slice(&buf);
    payload.extend_from_slice(&tag);
    Ok(BASE64.encode(payload))
}

/// Decrypt a base64 payload produced by [`encrypt`].
///
/// The MAC is checked (in constant time) before any decryption happens;
/// a tampered nonce, ciphertext, or tag is rejected outright.
pub fn decrypt(payload: &str, key: &[u8; 32]) -> Result<String, CoreError> {
    let data = BASE64
        .decode(payload)
        .map_err(|e| CoreError::Decryption(format!("invalid base64: {e}")))?;
    if data.len() < MIN_PAYLOAD_LEN {
        return Err(CoreError::Decryption(format!(
            "payload too short: {} < {MIN_PAYLOAD_LEN}",
            data.len()
        )));
    }
    if data[0] != VERSION {
        return Err(CoreError::Decryption(format!("unknown version {}", data[0])));
    }

    let nonce: [u8; NONCE_LEN] = data[1..1 + NONCE_LEN].try_into().expect("slice is 32 bytes");
    let ciphertext = &data[1 + NONCE_LEN..data.len() - MAC_LEN];
    let tag = &data[data.len() - MAC_LEN..];

    let (chacha_key, chacha_nonce, hmac_key) = message_keys(key, &nonce)?;

    let mut mac = HmacSha256::new_from_slice(&hmac_key)
        .map_err(|e| CoreError::Decryption(e.to_string()))?;
    mac.update(&nonce);
    mac.update(ciphertext);
    mac.verify_slice(tag)
        .map_err(|_| CoreError::Decryption("MAC mismatch".into()))?;

    let mut buf = ciphertext.to_vec();
    let mut cipher = ChaCha20::new(Key::from_slice(&chacha_key), Nonce::from_slice(&chacha_nonce));
    cipher.apply_keystream(&mut buf);

    unpad(&buf)
}

/// HKDF-Expand the conversation key with the message nonce into the
/// per-message ChaCha key, ChaCha nonce, and HMAC key.
fn message_keys(
    key: &[u8; 32],
    nonce: &[u8; NONCE_LEN],
) -> Result<([u8; 32], [u8; 12], [u8; 32]), CoreError> {
    let hk = Hkdf::<Sha256>::from_prk(key)
        .map_err(|e| CoreError::Encryption(format!("invalid conversation key: {e}")))?;
    let mut okm = [0u8; OKM_LEN];
    hk.expand(nonce, &mut okm)
        .map_err(|e| CoreError::Encryption(format!("HKDF expand: {e}")))?;

    let chacha_key: [u8; 32] = okm[..32].try_into().expect("slice is 32 bytes");
    let chacha_nonce: [u8; 12] = okm[32..44].try_into().expect("slice is 12 bytes");
    let hmac_key: [u8; 32] = okm[44..76].try_into().expect("slice is 32 bytes");
    Ok((chacha_key, chacha_nonce, hmac_key))
}

/// `[2-byte big-endian length] || plaintext || zeros` up to the padded length.
fn pad(plaintext: &[u8]) -> Result<Vec<u8>, CoreError> {
    let len = plaintext.len();
    if len == 0 || len > MAX_PLAINTEXT_LEN {
        return Err(CoreError::Encryption(format!("invalid plaintext length {len}")));
    }
    let mut padded = vec![0u8; 2 + calc_padded_len(len)];
    padded[0] = (len >> 8) as u8;
    padded[1] = (len & 0xff) as u8;
    padded[2..2 + len].copy_from_slice(plaintext);
    Ok(padded)
}

fn unpad(padded: &[u8]) -> Result<String, CoreError> {
    if padded.len() < 3 {
        return Err(CoreError::Decryption("padded message too short".into()));
    }
    let len = ((padded[0] as usize) << 8) | padded[1] as usize;
    if len == 0 || len > MAX_PLAINTEXT_LEN || padded.len() != 2 + calc_padded_len(len) {
        return Err(CoreError::Decryption("invalid padding".into()));
    }
    String::from_utf8(padded[2..2 + len].to_vec())
        .map_err(|e| CoreError::Decryption(format!("invalid UTF-8: {e}")))
}

/// Padded length per the NIP-44 scheme: 32-byte blocks up to 256 bytes,
/// then blocks of one eighth of the next power of two.
fn calc_padded_len(unpadded: usize) -> usize {
    if unpadded <= 32 {
        return 32;
    }
    let next_power = unpadded.next_power_of_two();
    let chunk = if next_power <= 256 { 32 } else { next_power / 8 };
    chunk * ((unpadded - 1) / chunk + 1)
}
