//! Elliptic-curve ElGamal over secp521r1.
//!
//! Encrypts an integer `m < p` against a public point `Pub`:
//!
//! ```text
//! M1 = k*G            (k random)
//! S  = k*Pub
//! M2 = S.x * m mod p
//! ```
//!
//! The holder of the secret scalar `d` recovers `m = M2 * (d*M1).x^-1 mod p`.
//! Cryptogram fields are serialized as 131-digit lowercase hex, enough for
//! any 521-bit value.

use std::sync::OnceLock;

use num_bigint::BigUint;
use num_traits::{One, Zero};
use p521::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use p521::{AffinePoint, EncodedPoint, FieldBytes, NonZeroScalar, ProjectivePoint, SecretKey};
use rand::rngs::OsRng;

use crate::PrimitivesError;

/// Hex digits per serialized cryptogram field.
pub const FIELD_HEX_LEN: usize = 131;

/// Big-endian byte length of a secp521r1 field element.
const FIELD_BYTES_LEN: usize = 66;

fn field_prime() -> &'static BigUint {
    static P: OnceLock<BigUint> = OnceLock::new();
    P.get_or_init(|| (BigUint::one() << 521u32) - 1u32)
}

/// Left-pad the lowercase hex form of `n` with zeros to `FIELD_HEX_LEN` digits.
pub fn to_padded_hex(n: &BigUint) -> String {
    format!("{:0>width$}", n.to_str_radix(16), width = FIELD_HEX_LEN)
}

fn parse_hex_int(hex_str: &str) -> Result<BigUint, PrimitivesError> {
    if hex_str.is_empty() {
        return Err(PrimitivesError::InvalidHex("empty integer".to_string()));
    }
    BigUint::parse_bytes(hex_str.as_bytes(), 16)
        .ok_or_else(|| PrimitivesError::InvalidHex(hex_str.to_string()))
}

fn to_field_bytes(n: &BigUint) -> Result<FieldBytes, PrimitivesError> {
    let bytes = n.to_bytes_be();
    if bytes.len() > FIELD_BYTES_LEN {
        return Err(PrimitivesError::InvalidPublicKey("coordinate exceeds 521 bits".to_string()));
    }
    let mut padded = [0u8; FIELD_BYTES_LEN];
    padded[FIELD_BYTES_LEN - bytes.len()..].copy_from_slice(&bytes);
    Ok(FieldBytes::clone_from_slice(&padded))
}

fn point_from_coordinates(x: &BigUint, y: &BigUint) -> Result<AffinePoint, PrimitivesError> {
    let encoded = EncodedPoint::from_affine_coordinates(&to_field_bytes(x)?, &to_field_bytes(y)?, false);
    Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
        .ok_or(PrimitivesError::PointNotOnCurve)
}

fn coordinates(point: &AffinePoint) -> Result<(BigUint, BigUint), PrimitivesError> {
    let encoded = point.to_encoded_point(false);
    match (encoded.x(), encoded.y()) {
        (Some(x), Some(y)) => Ok((BigUint::from_bytes_be(x), BigUint::from_bytes_be(y))),
        _ => Err(PrimitivesError::PointNotOnCurve),
    }
}

// ---------------------------------------------------------------------------
// Cryptogram
// ---------------------------------------------------------------------------

/// An ElGamal cryptogram: the ephemeral point `M1` and the masked value `M2`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElGamalCiphertext {
    pub m1_x: BigUint,
    pub m1_y: BigUint,
    pub m2: BigUint,
}

impl ElGamalCiphertext {
    /// Serialize as `pad131(M1.x) || pad131(M1.y) || pad131(M2)`.
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(3 * FIELD_HEX_LEN);
        out.push_str(&to_padded_hex(&self.m1_x));
        out.push_str(&to_padded_hex(&self.m1_y));
        out.push_str(&to_padded_hex(&self.m2));
        out
    }

    /// Parse the 393-character form produced by [`ElGamalCiphertext::to_hex`].
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        if hex_str.len() != 3 * FIELD_HEX_LEN || !hex_str.is_ascii() {
            return Err(PrimitivesError::InvalidHex(format!(
                "expected {} hex digits, got {}",
                3 * FIELD_HEX_LEN,
                hex_str.len()
            )));
        }
        let (m1_x, rest) = hex_str.split_at(FIELD_HEX_LEN);
        let (m1_y, m2) = rest.split_at(FIELD_HEX_LEN);
        Ok(ElGamalCiphertext {
            m1_x: parse_hex_int(m1_x)?,
            m1_y: parse_hex_int(m1_y)?,
            m2: parse_hex_int(m2)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// A secp521r1 ElGamal public key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElGamalPublicKey {
    point: AffinePoint,
}

impl ElGamalPublicKey {
    /// Build a key from hex-encoded affine coordinates, as returned by an
    /// Apollo node's `getElGamalPublicKey` call.
    ///
    /// # Returns
    /// `Ok(ElGamalPublicKey)`, `InvalidHex` for bad digits, or
    /// `PointNotOnCurve` if the coordinates do not describe a curve point.
    pub fn from_hex_coordinates(x_hex: &str, y_hex: &str) -> Result<Self, PrimitivesError> {
        let point = point_from_coordinates(&parse_hex_int(x_hex)?, &parse_hex_int(y_hex)?)?;
        Ok(ElGamalPublicKey { point })
    }

    /// Affine coordinates as unpadded lowercase hex.
    pub fn to_hex_coordinates(&self) -> Result<(String, String), PrimitivesError> {
        let (x, y) = coordinates(&self.point)?;
        Ok((x.to_str_radix(16), y.to_str_radix(16)))
    }

    /// Encrypt an integer smaller than the field prime.
    ///
    /// A fresh ephemeral scalar is drawn from the OS RNG on every call.
    pub fn encrypt(&self, plaintext: &BigUint) -> Result<ElGamalCiphertext, PrimitivesError> {
        if plaintext >= field_prime() {
            return Err(PrimitivesError::EncryptionError(
                "plaintext exceeds the field prime".to_string(),
            ));
        }
        let k = NonZeroScalar::random(&mut OsRng);
        let m1 = (ProjectivePoint::GENERATOR * *k).to_affine();
        let shared = (ProjectivePoint::from(self.point) * *k).to_affine();

        let (m1_x, m1_y) = coordinates(&m1)?;
        let (s_x, _) = coordinates(&shared)?;
        let m2 = (s_x * plaintext) % field_prime();
        Ok(ElGamalCiphertext { m1_x, m1_y, m2 })
    }
}

/// A secp521r1 ElGamal secret key, held by the remote co-signing service.
#[derive(Clone)]
pub struct ElGamalSecretKey {
    inner: SecretKey,
}

impl ElGamalSecretKey {
    pub fn generate() -> Self {
        ElGamalSecretKey { inner: SecretKey::random(&mut OsRng) }
    }

    /// Load a secret scalar from 66 big-endian bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let inner = SecretKey::from_slice(bytes).map_err(|_| PrimitivesError::InvalidKeyLength {
            expected: FIELD_BYTES_LEN,
            got: bytes.len(),
        })?;
        Ok(ElGamalSecretKey { inner })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.inner.to_bytes().to_vec()
    }

    pub fn public_key(&self) -> ElGamalPublicKey {
        ElGamalPublicKey { point: *self.inner.public_key().as_affine() }
    }

    /// Recover the plaintext integer from a cryptogram.
    pub fn decrypt(&self, ciphertext: &ElGamalCiphertext) -> Result<BigUint, PrimitivesError> {
        let m1 = point_from_coordinates(&ciphertext.m1_x, &ciphertext.m1_y)?;
        let d = self.inner.to_nonzero_scalar();
        let shared = (ProjectivePoint::from(m1) * *d).to_affine();
        let (s_x, _) = coordinates(&shared)?;
        if s_x.is_zero() {
            return Err(PrimitivesError::DecryptionError("degenerate shared point".to_string()));
        }
        let p = field_prime();
        let s_inv = s_x.modpow(&(p - 2u32), p);
        Ok((&ciphertext.m2 * s_inv) % p)
    }
}

impl std::fmt::Debug for ElGamalSecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ElGamalSecretKey(<redacted>)")
    }
}
