//! Deterministic curve25519 signatures.
//!
//! Apollo inherits the NXT signature scheme, a Schnorr-like construction
//! on the Montgomery curve. With `k` the clamped key seed and `P = k*G`:
//!
//! ```text
//! s  = (±k)^-1 mod q          sign chosen from the parity of P.y
//! m  = SHA-256(message)
//! x  = clamp(SHA-256(m || s))
//! Y  = X(x*G)
//! h  = SHA-256(m || Y)
//! v  = (x - h) * s mod q
//! signature = v || h
//! ```
//!
//! Verification recomputes `Y = X(v*P' + h*G)`, where `P'` is the point
//! with x coordinate `P` and even y, and compares `SHA-256(m || Y)` to `h`.
//! No randomness is involved; the same key and message always give the
//! same signature.

use curve25519_dalek::edwards::EdwardsPoint;
use curve25519_dalek::scalar::Scalar;
use x25519_dalek::{x25519, X25519_BASEPOINT_BYTES};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::ec::montgomery::even_lift;
use crate::ec::private_key::{clamp, KeySeed, SecretPhrase};
use crate::ec::public_key::PublicKey;
use crate::hash::{sha256, simple_hash};
use crate::util::constant_time_eq;
use crate::PrimitivesError;

/// Length of a serialized signature in bytes.
pub const SIGNATURE_LEN: usize = 64;

/// A 64-byte signature: scalar `v` followed by challenge hash `h`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    v: [u8; 32],
    h: [u8; 32],
}

impl Signature {
    pub fn new(v: [u8; 32], h: [u8; 32]) -> Self {
        Signature { v, h }
    }

    /// Parse a signature from 64 bytes.
    ///
    /// # Returns
    /// `Ok(Signature)`, or `InvalidSignature` if the input is not 64 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() != SIGNATURE_LEN {
            return Err(PrimitivesError::InvalidSignature(format!(
                "expected {} bytes, got {}",
                SIGNATURE_LEN,
                bytes.len()
            )));
        }
        let mut v = [0u8; 32];
        let mut h = [0u8; 32];
        v.copy_from_slice(&bytes[..32]);
        h.copy_from_slice(&bytes[32..]);
        Ok(Signature { v, h })
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        Self::from_bytes(&hex::decode(hex_str)?)
    }

    pub fn to_bytes(&self) -> [u8; SIGNATURE_LEN] {
        let mut out = [0u8; SIGNATURE_LEN];
        out[..32].copy_from_slice(&self.v);
        out[32..].copy_from_slice(&self.h);
        out
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn v(&self) -> &[u8; 32] {
        &self.v
    }

    pub fn h(&self) -> &[u8; 32] {
        &self.h
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({})", self.to_hex())
    }
}

/// Output of curve key generation for one seed.
#[derive(Zeroize, ZeroizeOnDrop)]
struct KeyMaterial {
    /// X coordinate of `k*G`.
    public: [u8; 32],
    /// Signing scalar `(±k)^-1 mod q`.
    s: Scalar,
}

fn keygen(seed: &[u8; 32]) -> Result<KeyMaterial, PrimitivesError> {
    let mut clamped = *seed;
    clamp(&mut clamped);
    let mut k = Scalar::from_bytes_mod_order(clamped);
    clamped.zeroize();
    if k == Scalar::ZERO {
        return Err(PrimitivesError::SigningError("key seed maps to the identity".into()));
    }

    let point = EdwardsPoint::mul_base(&k);
    let public = point.to_montgomery().to_bytes();
    let lifted = even_lift(&public)
        .ok_or_else(|| PrimitivesError::SigningError("public key has no curve point".into()))?;

    // The signing scalar belongs to the even-y point, so negate k when
    // k*G landed on the odd one.
    let mut signed = if point == lifted { k } else { -k };
    k.zeroize();
    let s = signed.invert();
    signed.zeroize();

    Ok(KeyMaterial { public, s })
}

/// Derive the internal signing scalar `s` for a key seed.
///
/// Distinct from the clamped private key used for key agreement.
pub fn signing_scalar(seed: &KeySeed) -> Result<[u8; 32], PrimitivesError> {
    Ok(keygen(seed.as_bytes())?.s.to_bytes())
}

/// Sign a message with a secret phrase.
///
/// # Arguments
/// * `message` - The bytes to sign (for transactions, the unsigned layout).
/// * `secret` - The signer's passphrase.
///
/// # Returns
/// The 64-byte signature, or `SigningError` if the curve step degenerates.
/// The scheme is deterministic, so such a failure is permanent for these inputs.
pub fn sign(message: &[u8], secret: &SecretPhrase) -> Result<Signature, PrimitivesError> {
    sign_with_seed(message, &secret.key_seed())
}

/// Sign a message with an already-derived key seed.
pub fn sign_with_seed(message: &[u8], seed: &KeySeed) -> Result<Signature, PrimitivesError> {
    let signer = keygen(seed.as_bytes())?;
    let m = sha256(message);

    let mut x_bytes = simple_hash(&[&m, signer.s.as_bytes()]);
    clamp(&mut x_bytes);
    let ephemeral = x25519(x_bytes, X25519_BASEPOINT_BYTES);
    let h = simple_hash(&[&m, &ephemeral]);

    let mut x = Scalar::from_bytes_mod_order(x_bytes);
    x_bytes.zeroize();
    let v = (x - Scalar::from_bytes_mod_order(h)) * signer.s;
    x.zeroize();
    if v == Scalar::ZERO {
        return Err(PrimitivesError::SigningError("signature scalar is zero".into()));
    }

    Ok(Signature { v: v.to_bytes(), h })
}

/// Verify a signature against a message and public key.
///
/// Returns `false` for any mismatch, including public keys whose x
/// coordinate is not on the curve.
pub fn verify(signature: &Signature, message: &[u8], public_key: &PublicKey) -> bool {
    let Some(point) = even_lift(public_key.as_bytes()) else {
        return false;
    };
    let v = Scalar::from_bytes_mod_order(signature.v);
    let h = Scalar::from_bytes_mod_order(signature.h);
    let y = EdwardsPoint::vartime_double_scalar_mul_basepoint(&v, &point, &h);

    let m = sha256(message);
    let h2 = simple_hash(&[&m, y.to_montgomery().as_bytes()]);
    constant_time_eq(&signature.h, &h2)
}
