//! AES-256-CBC message encryption between two accounts.
//!
//! ```text
//! key    = SHA-256(shared key XOR nonce)
//! output = IV(16) || AES-256-CBC(key, IV, PKCS#7(plaintext))
//! ```
//!
//! The shared key is usually the raw curve25519 shared secret of the two
//! accounts, see [`PrivateKey::encrypt_message`].

use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

use crate::ec::private_key::{PrivateKey, KEY_LEN};
use crate::ec::public_key::PublicKey;
use crate::hash::sha256;
use crate::PrimitivesError;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// IV length prepended to every message.
pub const MESSAGE_IV_LEN: usize = 16;

/// AES block length.
const BLOCK_LEN: usize = 16;

/// Derive the AES key: SHA-256 of the shared key, its first 32 bytes XORed
/// with the nonce if one is given.
fn message_key(shared_key: &[u8], nonce: Option<&[u8]>) -> Result<[u8; 32], PrimitivesError> {
    let mut mixed = shared_key.to_vec();
    if let Some(nonce) = nonce {
        if nonce.len() != KEY_LEN {
            return Err(PrimitivesError::InvalidKeyLength { expected: KEY_LEN, got: nonce.len() });
        }
        if mixed.len() < KEY_LEN {
            mixed.resize(KEY_LEN, 0);
        }
        for (b, n) in mixed.iter_mut().zip(nonce) {
            *b ^= n;
        }
    }
    let key = sha256(&mixed);
    mixed.zeroize();
    Ok(key)
}

/// Encrypt a message under a fresh random IV.
///
/// # Arguments
/// * `plaintext` - The message bytes.
/// * `shared_key` - Key material shared by both parties.
/// * `nonce` - Optional 32-byte nonce mixed into the key.
///
/// # Returns
/// `IV || ciphertext`, or `InvalidKeyLength` for a nonce that is not 32 bytes.
pub fn aes_encrypt(
    plaintext: &[u8],
    shared_key: &[u8],
    nonce: Option<&[u8]>,
) -> Result<Vec<u8>, PrimitivesError> {
    let mut iv = [0u8; MESSAGE_IV_LEN];
    OsRng.fill_bytes(&mut iv);
    aes_encrypt_with_iv(plaintext, shared_key, nonce, &iv)
}

/// Encrypt a message under a caller-chosen IV.
pub fn aes_encrypt_with_iv(
    plaintext: &[u8],
    shared_key: &[u8],
    nonce: Option<&[u8]>,
    iv: &[u8; MESSAGE_IV_LEN],
) -> Result<Vec<u8>, PrimitivesError> {
    let mut key = message_key(shared_key, nonce)?;
    let cipher = Aes256CbcEnc::new_from_slices(&key, iv)
        .map_err(|e| PrimitivesError::EncryptionError(e.to_string()));
    key.zeroize();
    let ciphertext = cipher?.encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut out = Vec::with_capacity(MESSAGE_IV_LEN + ciphertext.len());
    out.extend_from_slice(iv);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypt `IV || ciphertext` produced by [`aes_encrypt`].
///
/// # Returns
/// The plaintext, or `DecryptionError` if the input is not a whole number
/// of blocks after the IV or the padding is invalid (usually a wrong key).
pub fn aes_decrypt(
    data: &[u8],
    shared_key: &[u8],
    nonce: Option<&[u8]>,
) -> Result<Vec<u8>, PrimitivesError> {
    if data.len() < MESSAGE_IV_LEN + BLOCK_LEN || (data.len() - MESSAGE_IV_LEN) % BLOCK_LEN != 0 {
        return Err(PrimitivesError::DecryptionError(format!(
            "expected IV plus whole AES blocks, got {} bytes",
            data.len()
        )));
    }
    let (iv, ciphertext) = data.split_at(MESSAGE_IV_LEN);

    let mut key = message_key(shared_key, nonce)?;
    let cipher = Aes256CbcDec::new_from_slices(&key, iv)
        .map_err(|e| PrimitivesError::DecryptionError(e.to_string()));
    key.zeroize();
    cipher?
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| PrimitivesError::DecryptionError("invalid padding".to_string()))
}

impl PrivateKey {
    /// Encrypt a message for `public_key` under the accounts' shared secret.
    pub fn encrypt_message(
        &self,
        public_key: &PublicKey,
        plaintext: &[u8],
        nonce: Option<&[u8]>,
    ) -> Result<Vec<u8>, PrimitivesError> {
        let mut secret = self.shared_secret(public_key);
        let out = aes_encrypt(plaintext, &secret, nonce);
        secret.zeroize();
        out
    }

    /// Decrypt a message from `public_key` encrypted with [`PrivateKey::encrypt_message`].
    pub fn decrypt_message(
        &self,
        public_key: &PublicKey,
        data: &[u8],
        nonce: Option<&[u8]>,
    ) -> Result<Vec<u8>, PrimitivesError> {
        let mut secret = self.shared_secret(public_key);
        let out = aes_decrypt(data, &secret, nonce);
        secret.zeroize();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ec::SecretPhrase;

    const PHRASE_A: &str = "Red fox jumps over the Lazy dog";
    const PHRASE_B: &str = "Red dog jumps over the Lazy fox";

    #[test]
    fn test_round_trip() {
        let key = b"0123456789abcdef0123456789abcdef";
        let sealed = aes_encrypt(b"hello apollo", key, None).unwrap();
        assert_eq!(sealed.len(), MESSAGE_IV_LEN + BLOCK_LEN);
        assert_eq!(aes_decrypt(&sealed, key, None).unwrap(), b"hello apollo");
    }

    #[test]
    fn test_block_aligned_plaintext_gets_full_padding_block() {
        let key = [7u8; 32];
        let sealed = aes_encrypt_with_iv(&[1u8; 32], &key, None, &[0u8; 16]).unwrap();
        assert_eq!(sealed.len(), MESSAGE_IV_LEN + 48);
        assert_eq!(&sealed[..16], &[0u8; 16]);
        assert_eq!(aes_decrypt(&sealed, &key, None).unwrap(), vec![1u8; 32]);
    }

    #[test]
    fn test_wrong_key_does_not_decrypt() {
        let sealed = aes_encrypt_with_iv(b"secret note", &[1u8; 32], None, &[9u8; 16]).unwrap();
        let opened = aes_decrypt(&sealed, &[2u8; 32], None);
        assert!(opened.map_or(true, |pt| pt != b"secret note"));
    }

    #[test]
    fn test_nonce_changes_key() {
        let nonce = [0x5au8; 32];
        let sealed = aes_encrypt_with_iv(b"nonce", &[3u8; 32], Some(&nonce), &[1u8; 16]).unwrap();
        assert_eq!(aes_decrypt(&sealed, &[3u8; 32], Some(&nonce)).unwrap(), b"nonce");
        let plain = aes_encrypt_with_iv(b"nonce", &[3u8; 32], None, &[1u8; 16]).unwrap();
        assert_ne!(sealed, plain);
        assert!(matches!(
            aes_encrypt(b"x", &[3u8; 32], Some(&[1u8; 8])),
            Err(PrimitivesError::InvalidKeyLength { expected: 32, got: 8 })
        ));
    }

    #[test]
    fn test_rejects_truncated_input() {
        let sealed = aes_encrypt(b"abc", &[4u8; 32], None).unwrap();
        assert!(matches!(
            aes_decrypt(&sealed[..20], &[4u8; 32], None),
            Err(PrimitivesError::DecryptionError(_))
        ));
        assert!(aes_decrypt(&sealed[..16], &[4u8; 32], None).is_err());
    }

    #[test]
    fn test_message_between_accounts() {
        let a = SecretPhrase::new(PHRASE_A);
        let b = SecretPhrase::new(PHRASE_B);
        let sealed = a.private_key().encrypt_message(&b.public_key(), b"for b", None).unwrap();
        let opened = b.private_key().decrypt_message(&a.public_key(), &sealed, None).unwrap();
        assert_eq!(opened, b"for b");

        let eve = SecretPhrase::new("eve").private_key();
        let snooped = eve.decrypt_message(&a.public_key(), &sealed, None);
        assert!(snooped.map_or(true, |pt| pt != b"for b"));
    }
}
