//! Single- and multi-signature signing, and verification of signed bytes.
//!
//! Every signer signs the unsigned bytes: the header with a zeroed
//! signature field plus the appendix. A single signature is spliced into
//! the header at offset 96; multiple signatures go into a trailer in the
//! order the caller supplied them.

use apl_primitives::ec::{sign, verify, PublicKey, SecretPhrase, Signature};
use tracing::debug;

use crate::params::TransactionParams;
use crate::transaction::{
    build_unsigned, parse, SignedTransaction, UnsignedTransaction, MULTISIG_MAGIC,
    SIGNATURE_LEN, SIGNATURE_OFFSET,
};
use crate::TransactionError;

/// Sign and check the result against the signer's own public key.
fn sign_checked(message: &[u8], secret: &SecretPhrase) -> Result<Signature, TransactionError> {
    let signature = sign(message, secret)?;
    if !verify(&signature, message, &secret.public_key()) {
        return Err(TransactionError::Signing(
            "produced signature does not verify".to_string(),
        ));
    }
    Ok(signature)
}

/// Sign an unsigned transaction with one secret.
///
/// # Arguments
/// * `unsigned` - Bytes produced by [`build_unsigned`] or by a node.
/// * `secret` - The signer's passphrase.
///
/// # Returns
/// The bytes with the signature written at offset 96.
pub fn sign_single(
    unsigned: &UnsignedTransaction,
    secret: &SecretPhrase,
) -> Result<SignedTransaction, TransactionError> {
    let signature = sign_checked(unsigned.as_bytes(), secret)?;
    let mut bytes = unsigned.as_bytes().to_vec();
    bytes[SIGNATURE_OFFSET..SIGNATURE_OFFSET + SIGNATURE_LEN].copy_from_slice(&signature.to_bytes());
    Ok(SignedTransaction::from_vec_unchecked(bytes))
}

/// Sign an unsigned transaction with several secrets.
///
/// Each signer signs the same unsigned bytes. The trailer lists
/// `(key id, signature)` pairs in the order of `signers`.
///
/// # Returns
/// The signed bytes, or `Validation` unless there are between 1 and 255 signers.
pub fn sign_multi(
    unsigned: &UnsignedTransaction,
    signers: &[SecretPhrase],
) -> Result<SignedTransaction, TransactionError> {
    let count = u8::try_from(signers.len())
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| {
            TransactionError::Validation(format!(
                "multisig needs 1 to 255 signers, got {}",
                signers.len()
            ))
        })?;

    let base = unsigned.as_bytes();
    let mut bytes = Vec::with_capacity(base.len() + 9 + signers.len() * (8 + SIGNATURE_LEN));
    bytes.extend_from_slice(base);
    bytes.extend_from_slice(MULTISIG_MAGIC);
    bytes.extend_from_slice(&[0u8; 4]);
    bytes.push(count);
    for secret in signers {
        let signature = sign_checked(base, secret)?;
        bytes.extend_from_slice(&secret.public_key().key_id());
        bytes.extend_from_slice(&signature.to_bytes());
    }
    Ok(SignedTransaction::from_vec_unchecked(bytes))
}

/// Sign hex-encoded unsigned bytes, as returned by a node's
/// `unsignedTransactionBytes`.
pub fn sign_unsigned_hex(
    unsigned_hex: &str,
    secret: &SecretPhrase,
) -> Result<SignedTransaction, TransactionError> {
    sign_single(&UnsignedTransaction::from_hex(unsigned_hex)?, secret)
}

/// Verify the header signature against the embedded sender key.
///
/// # Returns
/// `Ok(false)` if the signature field is zero or does not verify,
/// `Malformed` if the bytes cannot be parsed.
pub fn verify_single(bytes: &[u8]) -> Result<bool, TransactionError> {
    let fields = parse(bytes)?;
    let Some(signature) = fields.signature else {
        return Ok(false);
    };
    let mut message = bytes[..fields.body_len].to_vec();
    message[SIGNATURE_OFFSET..SIGNATURE_OFFSET + SIGNATURE_LEN].fill(0);
    Ok(verify(&signature, &message, &fields.sender_public_key))
}

/// Verify every trailer entry.
///
/// Each key id is matched against `public_keys` and the embedded sender
/// key.
///
/// # Returns
/// `Ok(true)` only if a trailer exists and every entry matches a known key
/// and verifies.
pub fn verify_multi(bytes: &[u8], public_keys: &[PublicKey]) -> Result<bool, TransactionError> {
    let fields = parse(bytes)?;
    if fields.multisig.is_empty() {
        return Ok(false);
    }
    let message = &bytes[..fields.body_len];
    let candidates: Vec<&PublicKey> =
        public_keys.iter().chain(std::iter::once(&fields.sender_public_key)).collect();

    for entry in &fields.multisig {
        let Some(key) = candidates.iter().find(|k| k.key_id() == entry.key_id) else {
            debug!(key_id = %hex::encode(entry.key_id), "no public key for multisig entry");
            return Ok(false);
        };
        if !verify(&entry.signature, message, key) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Build and sign in one step.
///
/// With distinct sender and parent secrets the result is multi-signed by
/// the sender and then the parent. Otherwise the sender secret, or failing
/// that the parent secret, signs alone.
///
/// # Returns
/// The signed bytes, or `Validation` if no secret is present.
pub fn generate_transaction_bytes(
    params: &TransactionParams,
) -> Result<SignedTransaction, TransactionError> {
    let unsigned = build_unsigned(params)?;
    match (&params.sender_secret, &params.parent_secret) {
        (Some(sender), Some(parent)) if params.is_multisig() => {
            debug!("signing with sender and parent secrets");
            sign_multi(&unsigned, &[sender.clone(), parent.clone()])
        }
        (Some(secret), _) | (None, Some(secret)) => {
            debug!("signing with a single secret");
            sign_single(&unsigned, secret)
        }
        (None, None) => Err(TransactionError::Validation(
            "a signer secret is required to sign".to_string(),
        )),
    }
}
