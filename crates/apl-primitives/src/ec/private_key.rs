//! Secret material: passphrases, key seeds and clamped private keys.
//!
//! Every Apollo key is derived from a secret phrase:
//!
//! ```text
//! KeySeed    = SHA-256(UTF-8 phrase)
//! PrivateKey = clamp(KeySeed)
//! PublicKey  = X(PrivateKey * G)
//! ```
//!
//! All three secret types zero their memory on drop and redact their
//! `Debug` output.

use std::fmt;

use rand::rngs::OsRng;
use rand::Rng;
use x25519_dalek::{x25519, X25519_BASEPOINT_BYTES};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::ec::public_key::PublicKey;
use crate::hash::sha256;
use crate::PrimitivesError;

/// Length of a key seed, private key and shared secret in bytes.
pub const KEY_LEN: usize = 32;

/// Word count of generated passphrases.
const GENERATED_WORDS: usize = 12;

/// Syllables combined into generated passphrase words.
const SYLLABLES: [&str; 32] = [
    "ba", "ce", "di", "fo", "gu", "ha", "je", "ki", "lo", "mu", "na", "pe", "ri", "so", "tu", "va",
    "we", "xi", "yo", "zu", "br", "cl", "dr", "fl", "gr", "kr", "pl", "st", "th", "tr", "sh", "ch",
];

/// Apply curve25519 scalar clamping in place.
///
/// Clears the three low bits of byte 0, clears bit 7 of byte 31 and sets
/// bit 6 of byte 31.
pub fn clamp(bytes: &mut [u8; KEY_LEN]) {
    bytes[0] &= 248;
    bytes[31] &= 127;
    bytes[31] |= 64;
}

/// A secret passphrase: a UTF-8 string or an equivalent raw byte seed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretPhrase {
    bytes: Vec<u8>,
}

impl SecretPhrase {
    /// Wrap a UTF-8 passphrase.
    pub fn new(phrase: &str) -> Self {
        SecretPhrase { bytes: phrase.as_bytes().to_vec() }
    }

    /// Wrap raw passphrase bytes. They are hashed exactly like UTF-8 text.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        SecretPhrase { bytes: bytes.to_vec() }
    }

    /// Generate a random passphrase of twelve lowercase words using the OS RNG.
    ///
    /// # Returns
    /// A new `SecretPhrase` with roughly 180 bits of entropy.
    pub fn generate() -> Self {
        let mut rng = OsRng;
        let words: Vec<String> = (0..GENERATED_WORDS)
            .map(|_| {
                (0..3)
                    .map(|_| SYLLABLES[rng.gen_range(0..SYLLABLES.len())])
                    .collect::<String>()
            })
            .collect();
        let phrase = words.join(" ");
        SecretPhrase { bytes: phrase.into_bytes() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Hash the phrase into its 32-byte key seed.
    pub fn key_seed(&self) -> KeySeed {
        KeySeed(sha256(&self.bytes))
    }

    /// Derive the clamped curve25519 private key.
    pub fn private_key(&self) -> PrivateKey {
        self.key_seed().private_key()
    }

    /// Derive the public key. Same phrase, same key.
    pub fn public_key(&self) -> PublicKey {
        self.private_key().public_key()
    }
}

impl From<&str> for SecretPhrase {
    fn from(phrase: &str) -> Self {
        SecretPhrase::new(phrase)
    }
}

impl From<String> for SecretPhrase {
    fn from(phrase: String) -> Self {
        SecretPhrase { bytes: phrase.into_bytes() }
    }
}

impl fmt::Debug for SecretPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretPhrase(<redacted>)")
    }
}

/// SHA-256 of a secret phrase. Input to both key derivation and signing.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct KeySeed([u8; KEY_LEN]);

impl KeySeed {
    /// Use an already-hashed 32-byte seed.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        KeySeed(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Clamp the seed into a private key.
    pub fn private_key(&self) -> PrivateKey {
        let mut bytes = self.0;
        clamp(&mut bytes);
        let key = PrivateKey { bytes };
        bytes.zeroize();
        key
    }
}

impl fmt::Debug for KeySeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeySeed(<redacted>)")
    }
}

/// A clamped curve25519 scalar used for key agreement.
///
/// This is not the scalar used inside signatures; see
/// [`crate::ec::signature`] for how the signing scalar is derived.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey {
    bytes: [u8; KEY_LEN],
}

impl PrivateKey {
    /// Create a private key from 32 raw bytes. The bytes are clamped.
    ///
    /// # Returns
    /// `Ok(PrivateKey)`, or `InvalidKeyLength` if `bytes` is not 32 bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let mut raw: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            PrimitivesError::InvalidKeyLength { expected: KEY_LEN, got: bytes.len() }
        })?;
        clamp(&mut raw);
        let key = PrivateKey { bytes: raw };
        raw.zeroize();
        Ok(key)
    }

    /// Create a private key from a 64-character hex string.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        let mut bytes = hex::decode(hex_str)?;
        let key = Self::from_bytes(&bytes);
        bytes.zeroize();
        key
    }

    pub fn to_bytes(&self) -> [u8; KEY_LEN] {
        self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// The matching public key, `X(k * G)`.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_array(x25519(self.bytes, X25519_BASEPOINT_BYTES))
    }

    /// Diffie-Hellman shared secret with another party's public key.
    ///
    /// Symmetric: `a.shared_secret(&B) == b.shared_secret(&A)`.
    pub fn shared_secret(&self, public_key: &PublicKey) -> [u8; KEY_LEN] {
        x25519(self.bytes, *public_key.as_bytes())
    }

    /// Shared key: SHA-256 of the shared secret, optionally XORed with a nonce.
    ///
    /// # Arguments
    /// * `public_key` - The other party's public key.
    /// * `nonce` - Optional 32-byte nonce.
    ///
    /// # Returns
    /// The 32-byte key, or `InvalidKeyLength` if a nonce of another length is given.
    pub fn shared_key(
        &self,
        public_key: &PublicKey,
        nonce: Option<&[u8]>,
    ) -> Result<[u8; KEY_LEN], PrimitivesError> {
        let mut secret = self.shared_secret(public_key);
        let key = shared_key(&secret, nonce);
        secret.zeroize();
        key
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// Turn a shared secret into a shared key: `SHA-256(secret XOR nonce)`.
///
/// Without a nonce this is `SHA-256(secret)`.
pub fn shared_key(
    shared_secret: &[u8; KEY_LEN],
    nonce: Option<&[u8]>,
) -> Result<[u8; KEY_LEN], PrimitivesError> {
    let mut mixed = *shared_secret;
    if let Some(nonce) = nonce {
        if nonce.len() != KEY_LEN {
            return Err(PrimitivesError::InvalidKeyLength { expected: KEY_LEN, got: nonce.len() });
        }
        for (b, n) in mixed.iter_mut().zip(nonce) {
            *b ^= n;
        }
    }
    let key = sha256(&mixed);
    mixed.zeroize();
    Ok(key)
}
