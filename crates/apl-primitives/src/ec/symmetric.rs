//! AES-256-GCM session keys.
//!
//! The passphrase envelope encrypts the secret phrase under a random
//! 32-byte session key with a 16-byte IV. GCM with a non-96-bit IV derives
//! the initial counter block by GHASHing the IV, which is implemented here
//! directly on top of the `aes` block cipher.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockEncrypt, KeyInit};
use aes::Aes256;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::util::constant_time_eq;
use crate::PrimitivesError;

/// Session key length in bytes.
pub const SESSION_KEY_LEN: usize = 32;

/// IV length used by the passphrase envelope.
pub const IV_LEN: usize = 16;

/// AES-GCM authentication tag length.
pub const TAG_LEN: usize = 16;

/// The three parts of an AES-GCM encryption, kept separate because the
/// envelope serializes them as separate hex fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SealedPayload {
    pub iv: [u8; IV_LEN],
    pub ciphertext: Vec<u8>,
    pub tag: [u8; TAG_LEN],
}

/// A random AES-256 key used for a single envelope.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey {
    key: [u8; SESSION_KEY_LEN],
}

impl SessionKey {
    pub fn new(key: [u8; SESSION_KEY_LEN]) -> Self {
        SessionKey { key }
    }

    /// Create a session key from a byte slice.
    ///
    /// # Returns
    /// `Ok(SessionKey)`, or `InvalidKeyLength` unless exactly 32 bytes are given.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let key: [u8; SESSION_KEY_LEN] = bytes.try_into().map_err(|_| {
            PrimitivesError::InvalidKeyLength { expected: SESSION_KEY_LEN, got: bytes.len() }
        })?;
        Ok(SessionKey { key })
    }

    /// Generate a random session key from the OS RNG.
    pub fn new_random() -> Self {
        let mut key = [0u8; SESSION_KEY_LEN];
        OsRng.fill_bytes(&mut key);
        SessionKey { key }
    }

    pub fn as_bytes(&self) -> &[u8; SESSION_KEY_LEN] {
        &self.key
    }

    /// Encrypt `plaintext` under a fresh random 16-byte IV.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<SealedPayload, PrimitivesError> {
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);
        self.encrypt_with_iv(plaintext, &iv)
    }

    /// Encrypt `plaintext` under a caller-chosen IV.
    ///
    /// # Arguments
    /// * `plaintext` - The data to encrypt.
    /// * `iv` - A 16-byte initialization vector; never reuse one under the same key.
    ///
    /// # Returns
    /// The IV, ciphertext and 16-byte tag.
    pub fn encrypt_with_iv(
        &self,
        plaintext: &[u8],
        iv: &[u8; IV_LEN],
    ) -> Result<SealedPayload, PrimitivesError> {
        let cipher = self.cipher().map_err(PrimitivesError::EncryptionError)?;
        let (ciphertext, tag) = gcm_encrypt(&cipher, iv, plaintext, &[]);
        Ok(SealedPayload { iv: *iv, ciphertext, tag })
    }

    /// Decrypt and authenticate a sealed payload.
    ///
    /// # Returns
    /// The plaintext, or `DecryptionError` if the tag does not match.
    pub fn decrypt(&self, payload: &SealedPayload) -> Result<Vec<u8>, PrimitivesError> {
        let cipher = self.cipher().map_err(PrimitivesError::DecryptionError)?;
        gcm_decrypt(&cipher, &payload.iv, &payload.ciphertext, &payload.tag, &[])
            .ok_or_else(|| PrimitivesError::DecryptionError("authentication failed".to_string()))
    }

    fn cipher(&self) -> Result<Aes256, String> {
        Aes256::new_from_slice(&self.key).map_err(|e| e.to_string())
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionKey(<redacted>)")
    }
}

// ---------------------------------------------------------------------------
// GCM
// ---------------------------------------------------------------------------

type Block = [u8; 16];

/// GCM encryption with an arbitrary-length IV. Returns `(ciphertext, tag)`.
fn gcm_encrypt(cipher: &Aes256, iv: &[u8], plaintext: &[u8], aad: &[u8]) -> (Vec<u8>, Block) {
    let h = hash_subkey(cipher);
    let j0 = initial_counter(&h, iv);
    let ciphertext = ctr_apply(cipher, &j0, plaintext);
    let tag = compute_tag(cipher, &h, &j0, aad, &ciphertext);
    (ciphertext, tag)
}

/// GCM decryption. Returns `None` when authentication fails.
fn gcm_decrypt(
    cipher: &Aes256,
    iv: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
    aad: &[u8],
) -> Option<Vec<u8>> {
    let h = hash_subkey(cipher);
    let j0 = initial_counter(&h, iv);
    let expected = compute_tag(cipher, &h, &j0, aad, ciphertext);
    if !constant_time_eq(tag, &expected) {
        return None;
    }
    Some(ctr_apply(cipher, &j0, ciphertext))
}

fn encrypt_block(cipher: &Aes256, block: &Block) -> Block {
    let mut b = GenericArray::clone_from_slice(block);
    cipher.encrypt_block(&mut b);
    let mut out = [0u8; 16];
    out.copy_from_slice(&b);
    out
}

/// H = E(K, 0^128)
fn hash_subkey(cipher: &Aes256) -> Block {
    encrypt_block(cipher, &[0u8; 16])
}

/// J0: `IV || 0^31 || 1` for 96-bit IVs, otherwise `GHASH(IV || len64(IV))`.
fn initial_counter(h: &Block, iv: &[u8]) -> Block {
    if iv.len() == 12 {
        let mut j = [0u8; 16];
        j[..12].copy_from_slice(iv);
        j[15] = 1;
        return j;
    }
    let mut state = [0u8; 16];
    ghash_update(&mut state, h, iv);
    let mut len_block = [0u8; 16];
    len_block[8..].copy_from_slice(&((iv.len() as u64) * 8).to_be_bytes());
    ghash_update(&mut state, h, &len_block);
    state
}

/// CTR keystream starting at inc32(J0). Encryption and decryption are the same operation.
fn ctr_apply(cipher: &Aes256, j0: &Block, input: &[u8]) -> Vec<u8> {
    let mut counter = *j0;
    let mut out = Vec::with_capacity(input.len());
    for chunk in input.chunks(16) {
        inc32(&mut counter);
        let keystream = encrypt_block(cipher, &counter);
        out.extend(chunk.iter().zip(keystream.iter()).map(|(a, k)| a ^ k));
    }
    out
}

/// tag = GHASH(H, A, C) XOR E(K, J0)
fn compute_tag(cipher: &Aes256, h: &Block, j0: &Block, aad: &[u8], ciphertext: &[u8]) -> Block {
    let mut state = [0u8; 16];
    ghash_update(&mut state, h, aad);
    ghash_update(&mut state, h, ciphertext);
    let mut len_block = [0u8; 16];
    len_block[..8].copy_from_slice(&((aad.len() as u64) * 8).to_be_bytes());
    len_block[8..].copy_from_slice(&((ciphertext.len() as u64) * 8).to_be_bytes());
    ghash_update(&mut state, h, &len_block);

    let mask = encrypt_block(cipher, j0);
    let mut tag = [0u8; 16];
    for (t, (s, m)) in tag.iter_mut().zip(state.iter().zip(mask.iter())) {
        *t = s ^ m;
    }
    tag
}

/// Increment the rightmost 32 bits of a counter block (big-endian).
fn inc32(counter: &mut Block) {
    let mut ctr = [0u8; 4];
    ctr.copy_from_slice(&counter[12..]);
    let next = u32::from_be_bytes(ctr).wrapping_add(1);
    counter[12..].copy_from_slice(&next.to_be_bytes());
}

/// Absorb `data` into a GHASH state, zero-padding the final block.
fn ghash_update(state: &mut Block, h: &Block, data: &[u8]) {
    for chunk in data.chunks(16) {
        for (s, d) in state.iter_mut().zip(chunk) {
            *s ^= d;
        }
        gf_mul(state, h);
    }
}

/// Multiply `x` by `y` in GF(2^128) with the GCM reduction polynomial.
fn gf_mul(x: &mut Block, y: &Block) {
    let mut z = [0u8; 16];
    let mut v = *y;

    for i in 0..128 {
        if x[i / 8] & (1 << (7 - (i % 8))) != 0 {
            for (zb, vb) in z.iter_mut().zip(v.iter()) {
                *zb ^= vb;
            }
        }
        let lsb = v[15] & 1;
        for j in (1..16).rev() {
            v[j] = (v[j] >> 1) | (v[j - 1] << 7);
        }
        v[0] >>= 1;
        if lsb == 1 {
            v[0] ^= 0xe1;
        }
    }

    *x = z;
}
