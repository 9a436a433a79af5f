//! Hash function primitives.
//!
//! Apollo uses plain SHA-256 throughout: key seeds, account ids, the
//! signature challenge and the envelope digest are all SHA-256 outputs.

use sha2::{Digest, Sha256};

/// Compute SHA-256 hash of the input data.
///
/// # Arguments
/// * `data` - Byte slice to hash.
///
/// # Returns
/// A 32-byte SHA-256 digest.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute SHA-256 over the concatenation of several byte strings.
///
/// Equivalent to `sha256(parts[0] || parts[1] || ...)` without building the
/// concatenated buffer. The signer uses it as `hash(m, s)` and `hash(m, y)`.
///
/// # Arguments
/// * `parts` - Message followed by any number of nonces.
///
/// # Returns
/// A 32-byte SHA-256 digest.
pub fn simple_hash(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_empty() {
        assert_eq!(
            hex::encode(sha256(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_simple_hash_matches_concatenation() {
        let a = b"Red fox jumps over the Lazy dog";
        let b = [7u8; 32];
        let joined = [a.as_slice(), b.as_slice()].concat();
        assert_eq!(simple_hash(&[a, &b]), sha256(&joined));
        assert_eq!(simple_hash(&[]), sha256(b""));
    }

    #[test]
    fn test_simple_hash_known_vector() {
        let nonce1: Vec<u8> = (0u8..32).collect();
        let nonce2: Vec<u8> = (32u8..64).collect();
        let digest = simple_hash(&[b"Red fox jumps over the Lazy dog", &nonce1, &nonce2]);
        assert_eq!(
            hex::encode(digest),
            "b1702f2262274290d1428b04f2e55e5af3af413575c7659ac02ee5633c504c6f"
        );
    }
}
