//! Passphrase envelope wire format.
//!
//! An envelope is a single lowercase hex string:
//!
//! | Field              | Hex digits | Description                                    |
//! |--------------------|------------|------------------------------------------------|
//! | iv                 | 32         | AES-GCM IV (16 bytes)                          |
//! | ciphertext         | 2 * len    | AES-GCM ciphertext of the UTF-8 passphrase     |
//! | tag                | 32         | AES-GCM authentication tag                     |
//! | M1.x               | 131        | ElGamal ephemeral point, x                     |
//! | M1.y               | 131        | ElGamal ephemeral point, y                     |
//! | M2                 | 131        | ElGamal-masked session key                     |
//! | digest             | 64         | SHA-256(passphrase bytes ‖ lossy-UTF-8(key))   |
//!
//! The digest hashes the session key after a lossy UTF-8 decode, as the
//! receiving service does, so it cannot be computed over the raw key bytes.

use num_bigint::BigUint;
use tracing::debug;
use zeroize::Zeroize;

use apl_primitives::ec::elgamal::{ElGamalCiphertext, ElGamalPublicKey, ElGamalSecretKey, FIELD_HEX_LEN};
use apl_primitives::ec::symmetric::{SealedPayload, SessionKey, IV_LEN, SESSION_KEY_LEN, TAG_LEN};
use apl_primitives::ec::SecretPhrase;
use apl_primitives::hash::sha256;
use apl_primitives::util::constant_time_eq;

use crate::EnvelopeError;

const DIGEST_HEX_LEN: usize = 64;
const FIXED_HEX_LEN: usize = 2 * IV_LEN + 2 * TAG_LEN + 3 * FIELD_HEX_LEN + DIGEST_HEX_LEN;

/// A parsed passphrase envelope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    pub payload: SealedPayload,
    pub cryptogram: ElGamalCiphertext,
    pub digest: [u8; 32],
}

impl Envelope {
    /// Serialize into the hex wire format.
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(FIXED_HEX_LEN + 2 * self.payload.ciphertext.len());
        out.push_str(&hex::encode(self.payload.iv));
        out.push_str(&hex::encode(&self.payload.ciphertext));
        out.push_str(&hex::encode(self.payload.tag));
        out.push_str(&self.cryptogram.to_hex());
        out.push_str(&hex::encode(self.digest));
        out
    }

    /// Parse the hex wire format.
    ///
    /// # Returns
    /// The envelope, or `Malformed` if the length cannot be split into the
    /// fixed fields plus a whole number of ciphertext bytes.
    pub fn from_hex(hex_str: &str) -> Result<Self, EnvelopeError> {
        if !hex_str.is_ascii() || hex_str.len() < FIXED_HEX_LEN {
            return Err(EnvelopeError::Malformed(format!(
                "expected at least {} hex digits, got {}",
                FIXED_HEX_LEN,
                hex_str.len()
            )));
        }
        let ct_hex_len = hex_str.len() - FIXED_HEX_LEN;
        if ct_hex_len % 2 != 0 {
            return Err(EnvelopeError::Malformed("odd ciphertext length".to_string()));
        }

        let (iv_hex, rest) = hex_str.split_at(2 * IV_LEN);
        let (ct_hex, rest) = rest.split_at(ct_hex_len);
        let (tag_hex, rest) = rest.split_at(2 * TAG_LEN);
        let (cryptogram_hex, digest_hex) = rest.split_at(3 * FIELD_HEX_LEN);

        let mut iv = [0u8; IV_LEN];
        let mut tag = [0u8; TAG_LEN];
        let mut digest = [0u8; 32];
        hex::decode_to_slice(iv_hex, &mut iv).map_err(apl_primitives::PrimitivesError::from)?;
        hex::decode_to_slice(tag_hex, &mut tag).map_err(apl_primitives::PrimitivesError::from)?;
        hex::decode_to_slice(digest_hex, &mut digest)
            .map_err(apl_primitives::PrimitivesError::from)?;
        let ciphertext = hex::decode(ct_hex).map_err(apl_primitives::PrimitivesError::from)?;

        Ok(Envelope {
            payload: SealedPayload { iv, ciphertext, tag },
            cryptogram: ElGamalCiphertext::from_hex(cryptogram_hex)?,
            digest,
        })
    }
}

/// Digest binding the passphrase to its session key.
fn envelope_digest(secret: &SecretPhrase, key: &SessionKey) -> [u8; 32] {
    let mut buf = secret.as_bytes().to_vec();
    buf.extend_from_slice(String::from_utf8_lossy(key.as_bytes()).as_bytes());
    let digest = sha256(&buf);
    buf.zeroize();
    digest
}

/// Seal a secret phrase for the holder of `remote_key`.
///
/// A new random session key and IV are drawn for every call, so sealing
/// the same phrase twice yields different envelopes.
///
/// # Arguments
/// * `secret` - The passphrase to forward.
/// * `remote_key` - The co-signing service's ElGamal public key.
///
/// # Returns
/// The envelope as a lowercase hex string.
pub fn seal_passphrase(
    secret: &SecretPhrase,
    remote_key: &ElGamalPublicKey,
) -> Result<String, EnvelopeError> {
    let key = SessionKey::new_random();
    let payload = key.encrypt(secret.as_bytes())?;
    let cryptogram = remote_key.encrypt(&BigUint::from_bytes_be(key.as_bytes()))?;
    let digest = envelope_digest(secret, &key);

    let envelope = Envelope { payload, cryptogram, digest };
    debug!(ciphertext_len = envelope.payload.ciphertext.len(), "sealed passphrase envelope");
    Ok(envelope.to_hex())
}

/// Open an envelope with the service's ElGamal secret key.
///
/// # Returns
/// The recovered passphrase, `Primitives(DecryptionError)` if the AES-GCM
/// tag fails, or `DigestMismatch` if the trailing digest does not match.
pub fn open_passphrase(
    envelope: &str,
    secret_key: &ElGamalSecretKey,
) -> Result<SecretPhrase, EnvelopeError> {
    let envelope = Envelope::from_hex(envelope)?;

    let key_int = secret_key.decrypt(&envelope.cryptogram)?;
    let key_bytes = key_int.to_bytes_be();
    if key_bytes.len() > SESSION_KEY_LEN {
        return Err(EnvelopeError::Malformed("session key exceeds 32 bytes".to_string()));
    }
    let mut raw = [0u8; SESSION_KEY_LEN];
    raw[SESSION_KEY_LEN - key_bytes.len()..].copy_from_slice(&key_bytes);
    let key = SessionKey::new(raw);
    raw.zeroize();

    let mut plaintext = key.decrypt(&envelope.payload)?;
    let secret = SecretPhrase::from_bytes(&plaintext);
    plaintext.zeroize();

    if !constant_time_eq(&envelope_digest(&secret, &key), &envelope.digest) {
        return Err(EnvelopeError::DigestMismatch);
    }
    Ok(secret)
}
