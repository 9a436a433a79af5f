//! Elliptic curve cryptography.
//!
//! Curve25519 keys, deterministic signatures, key agreement and AES-CBC
//! messages for Apollo accounts, plus the AES-GCM session keys and
//! secp521r1 ElGamal used to wrap a passphrase for a remote signer.

pub mod elgamal;
pub mod message;
mod montgomery;
pub mod private_key;
pub mod public_key;
pub mod signature;
pub mod symmetric;

pub use elgamal::{ElGamalCiphertext, ElGamalPublicKey, ElGamalSecretKey};
pub use message::{aes_decrypt, aes_encrypt};
pub use private_key::{clamp, shared_key, KeySeed, PrivateKey, SecretPhrase};
pub use public_key::PublicKey;
pub use signature::{sign, sign_with_seed, verify, Signature};
pub use symmetric::{SealedPayload, SessionKey};

/// Derive the public key for a secret phrase.
pub fn derive_public_key(secret: &SecretPhrase) -> PublicKey {
    secret.public_key()
}

/// Derive the clamped private key for a secret phrase.
pub fn derive_private_key(secret: &SecretPhrase) -> PrivateKey {
    secret.private_key()
}

/// Diffie-Hellman shared secret between `private_key` and `public_key`.
pub fn shared_secret(private_key: &PrivateKey, public_key: &PublicKey) -> [u8; 32] {
    private_key.shared_secret(public_key)
}
