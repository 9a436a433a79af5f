//! Curve25519 public keys and the account ids derived from them.

use std::fmt;

use crate::ec::signature::{self, Signature};
use crate::hash::sha256;
use crate::reed_solomon;
use crate::PrimitivesError;

/// Length of a serialized public key in bytes.
pub const PUBLIC_KEY_LEN: usize = 32;

/// A 32-byte curve25519 public key (little-endian x coordinate).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; PUBLIC_KEY_LEN]);

impl PublicKey {
    /// Create a PublicKey from 32 raw bytes.
    ///
    /// No curve membership check is made here; keys that are not on the
    /// curve simply never verify.
    ///
    /// # Returns
    /// `Ok(PublicKey)`, or `InvalidKeyLength` if `bytes` is not 32 bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let arr: [u8; PUBLIC_KEY_LEN] = bytes.try_into().map_err(|_| {
            PrimitivesError::InvalidKeyLength { expected: PUBLIC_KEY_LEN, got: bytes.len() }
        })?;
        Ok(PublicKey(arr))
    }

    pub(crate) fn from_array(bytes: [u8; PUBLIC_KEY_LEN]) -> Self {
        PublicKey(bytes)
    }

    /// Create a PublicKey from a 64-character hex string.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        Self::from_bytes(&hex::decode(hex_str)?)
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Numeric account id: the first 8 bytes of SHA-256(public key), little-endian.
    pub fn account_id(&self) -> u64 {
        let digest = sha256(&self.0);
        let mut id = [0u8; 8];
        id.copy_from_slice(&digest[..8]);
        u64::from_le_bytes(id)
    }

    /// Reed-Solomon address of [`PublicKey::account_id`], e.g. `APL-JTXK-TPXG-LYLT-F646A`.
    pub fn account_rs(&self) -> String {
        reed_solomon::encode(self.account_id())
    }

    /// The first 8 bytes of the key, used to tag signers in a multisig trailer.
    pub fn key_id(&self) -> [u8; 8] {
        let mut id = [0u8; 8];
        id.copy_from_slice(&self.0[..8]);
        id
    }

    /// Verify a signature over `message` made by this key.
    pub fn verify(&self, message: &[u8], sig: &Signature) -> bool {
        signature::verify(sig, message, self)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
