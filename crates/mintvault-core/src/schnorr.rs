//! BIP-340 Schnorr signatures over secp256k1.
//!
//! Implements the scheme directly on k256's group arithmetic rather than
//! an off-the-shelf signer: the even-y key normalization, the twice-tagged
//! hashes, and the deterministic nonce with auxiliary randomness all follow
//! BIP-340 exactly. Signatures are `R.x (32 bytes) || s (32 bytes)` and
//! verify against the 32-byte x-only public key.

use k256::elliptic_curve::group::Group;
use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::point::{AffineCoordinates, DecompressPoint};
use k256::elliptic_curve::subtle::Choice;
use k256::elliptic_curve::{Field, PrimeField};
use k256::{AffinePoint, FieldBytes, ProjectivePoint, Scalar, U256};
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::error::CoreError;

const AUX_TAG: &str = "BIP0340/aux";
const NONCE_TAG: &str = "BIP0340/nonce";
const CHALLENGE_TAG: &str = "BIP0340/challenge";

/// Attempts before giving up on a zero nonce. Each attempt draws fresh
/// auxiliary randomness, so a second attempt is already astronomically
/// unlikely to be needed.
const MAX_SIGN_ATTEMPTS: usize = 4;

/// SHA-256 with the tag hash prepended twice, per BIP-340.
fn tagged_hash(tag: &str, chunks: &[&[u8]]) -> [u8; 32] {
    let tag_hash = Sha256::digest(tag.as_bytes());
    let mut hasher = Sha256::new();
    hasher.update(tag_hash);
    hasher.update(tag_hash);
    for chunk in chunks {
        hasher.update(chunk);
    }
    hasher.finalize().into()
}

/// Parse 32 big-endian bytes as a nonzero scalar in `[1, n-1]`.
pub(crate) fn parse_scalar(bytes: &[u8; 32]) -> Result<Scalar, CoreError> {
    let scalar = Option::<Scalar>::from(Scalar::from_repr(FieldBytes::from(*bytes)))
        .ok_or(CoreError::InvalidScalar)?;
    if bool::from(scalar.is_zero()) {
        return Err(CoreError::InvalidScalar);
    }
    Ok(scalar)
}

/// Lift an x-only public key to the curve point with even y.
pub(crate) fn lift_x(x: &[u8; 32]) -> Option<AffinePoint> {
    Option::from(AffinePoint::decompress(&FieldBytes::from(*x), Choice::from(0)))
}

fn reduce(bytes: [u8; 32]) -> Scalar {
    <Scalar as Reduce<U256>>::reduce_bytes(&FieldBytes::from(bytes))
}

/// Sign a 32-byte message digest with a BIP-340 Schnorr signature.
///
/// Draws fresh auxiliary randomness from the OS CSPRNG; if nonce
/// derivation produces zero, the signature is re-derived with fresh
/// randomness rather than proceeding.
pub fn sign(secret: &[u8; 32], message: &[u8; 32]) -> Result<[u8; 64], CoreError> {
    let mut aux = [0u8; 32];
    for _ in 0..MAX_SIGN_ATTEMPTS {
        rand::rngs::OsRng.fill_bytes(&mut aux);
        match sign_with_aux(secret, message, &aux) {
            Err(CoreError::ZeroNonce) => continue,
            other => return other,
        }
    }
    Err(CoreError::ZeroNonce)
}

/// BIP-340 signing with caller-supplied auxiliary randomness.
///
/// Exposed so the official test vectors (which fix `aux`) can be checked;
/// production code goes through [`sign`].
pub fn sign_with_aux(
    secret: &[u8; 32],
    message: &[u8; 32],
    aux: &[u8; 32],
) -> Result<[u8; 64], CoreError> {
    let d0 = parse_scalar(secret)?;

    // Normalize to the even-y form of the public key.
    let p = (ProjectivePoint::GENERATOR * d0).to_affine();
    let px: [u8; 32] = p.x().into();
    let d = if bool::from(p.y_is_odd()) { -d0 } else { d0 };

    // t = d xor H_aux(aux)
    let aux_hash = tagged_hash(AUX_TAG, &[aux]);
    let mut d_bytes: [u8; 32] = d.to_bytes().into();
    let mut t = [0u8; 32];
    for (i, byte) in t.iter_mut().enumerate() {
        *byte = d_bytes[i] ^ aux_hash[i];
    }
    d_bytes.zeroize();

    // k' = H_nonce(t || P.x || m) mod n
    let k0 = reduce(tagged_hash(NONCE_TAG, &[&t, &px, message]));
    t.zeroize();
    if bool::from(k0.is_zero()) {
        return Err(CoreError::ZeroNonce);
    }

    let r = (ProjectivePoint::GENERATOR * k0).to_affine();
    let k = if bool::from(r.y_is_odd()) { -k0 } else { k0 };
    let rx: [u8; 32] = r.x().into();

    // e = H_challenge(R.x || P.x || m) mod n
    let e = reduce(tagged_hash(CHALLENGE_TAG, &[&rx, &px, message]));
    let s = k + e * d;

    let mut signature = [0u8; 64];
    signature[..32].copy_from_slice(&rx);
    signature[32..].copy_from_slice(&s.to_bytes());
    Ok(signature)
}

/// Verify a BIP-340 signature against an x-only public key.
///
/// Recomputes the challenge from `(R.x, P.x, m)` and checks
/// `s*G == R + e*P` via `R' = s*G - e*P`: the result must be a
/// non-identity point with even y whose x-coordinate equals `R.x`.
pub fn verify(signature: &[u8; 64], public_x: &[u8; 32], message: &[u8; 32]) -> bool {
    let Some(p) = lift_x(public_x) else {
        return false;
    };

    let rx: [u8; 32] = signature[..32].try_into().expect("slice is 32 bytes");
    let s_bytes: [u8; 32] = signature[32..].try_into().expect("slice is 32 bytes");

    // R.x must itself be a valid even-y point encoding, and s must be a
    // canonical scalar. Out-of-range values are forgeries, not panics.
    if lift_x(&rx).is_none() {
        return false;
    }
    let Some(s) = Option::<Scalar>::from(Scalar::from_repr(FieldBytes::from(s_bytes))) else {
        return false;
    };

    let e = reduce(tagged_hash(CHALLENGE_TAG, &[&rx, public_x, message]));
    let r = ProjectivePoint::GENERATOR * s - ProjectivePoint::from(p) * e;
    if bool::from(r.is_identity()) {
        return false;
    }
    let r = r.to_affine();
    let r_x: [u8; 32] = r.x().into();
    !bool::from(r.y_is_odd()) && r_x == rx
}
