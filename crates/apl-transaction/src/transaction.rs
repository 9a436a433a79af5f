//! Fixed-offset transaction layout.
//!
//! # Wire format
//!
//! All integers are little-endian.
//!
//! | Offset | Field             | Size     |
//! |--------|-------------------|----------|
//! | 0      | type              | 1        |
//! | 1      | version / subtype | 1 (`version << 4 \| subtype`) |
//! | 2      | timestamp         | 4        |
//! | 6      | deadline          | 2        |
//! | 8      | sender public key | 32       |
//! | 40     | recipient id      | 8        |
//! | 48     | amount            | 8        |
//! | 56     | fee               | 8        |
//! | 64     | referenced hash   | 32       |
//! | 96     | signature         | 64       |
//! | 160    | flags             | 4        |
//! | 164    | ecBlock height    | 4        |
//! | 168    | ecBlock id        | 8        |
//! | 176    | appendix          | variable |
//!
//! A multi-signature transaction keeps the signature field zeroed and
//! appends a trailer:
//!
//! | Field     | Size                         |
//! |-----------|------------------------------|
//! | magic     | 4 (`MSIG`)                   |
//! | reserved  | 4 (zero)                     |
//! | count     | 1                            |
//! | entries   | count x (key id 8 + signature 64) |

use apl_primitives::ec::{PublicKey, Signature};
use apl_primitives::reed_solomon;
use apl_primitives::util::{hex_to_bytes, AplReader, AplWriter};
use tracing::debug;

use crate::appendix::Appendix;
use crate::params::{TransactionKind, TransactionParams};
use crate::TransactionError;

/// Length of the fixed header.
pub const HEADER_LEN: usize = 176;

/// Offset of the 64-byte signature field.
pub const SIGNATURE_OFFSET: usize = 96;

/// Length of the signature field.
pub const SIGNATURE_LEN: usize = 64;

/// Marker opening a multi-signature trailer.
pub const MULTISIG_MAGIC: &[u8; 4] = b"MSIG";

/// Deadline used when the caller does not set one, in minutes.
pub const DEFAULT_DEADLINE: u16 = 1440;

/// Flag bit set when a message attachment follows the header.
pub const MESSAGE_FLAG: u32 = 0x01;

const SINGLE_SIG_VERSION: u8 = 1;
const MULTI_SIG_VERSION: u8 = 2;

// ---------------------------------------------------------------------------
// Byte containers
// ---------------------------------------------------------------------------

/// Transaction bytes with a zeroed signature field and no trailer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsignedTransaction(Vec<u8>);

/// Transaction bytes carrying either a signature at offset 96 or a
/// multi-signature trailer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTransaction(Vec<u8>);

fn check_header_len(bytes: &[u8]) -> Result<(), TransactionError> {
    if bytes.len() < HEADER_LEN {
        return Err(TransactionError::Malformed(format!(
            "expected at least {} bytes, got {}",
            HEADER_LEN,
            bytes.len()
        )));
    }
    Ok(())
}

/// Decode node-provided hex; odd-length input follows the legacy codec.
fn decode_hex(hex_str: &str) -> Result<Vec<u8>, TransactionError> {
    hex_to_bytes(hex_str).map_err(|e| TransactionError::Malformed(e.to_string()))
}

/// Whether the bytes end in a well-formed `MSIG` trailer.
fn has_multisig_trailer(bytes: &[u8]) -> bool {
    (1..=usize::from(u8::MAX)).any(|count| {
        let Some(start) = bytes.len().checked_sub(9 + count * (8 + SIGNATURE_LEN)) else {
            return false;
        };
        start >= HEADER_LEN
            && &bytes[start..start + 4] == MULTISIG_MAGIC
            && usize::from(bytes[start + 8]) == count
    })
}

impl UnsignedTransaction {
    /// Wrap unsigned bytes, for example ones produced by a node.
    ///
    /// # Returns
    /// `Malformed` if the buffer is shorter than the fixed header, its
    /// signature field is not zero, or it already ends in a multi-signature
    /// trailer.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, TransactionError> {
        check_header_len(&bytes)?;
        if bytes[SIGNATURE_OFFSET..SIGNATURE_OFFSET + SIGNATURE_LEN].iter().any(|b| *b != 0) {
            return Err(TransactionError::Malformed(
                "signature field of unsigned bytes is not zero".to_string(),
            ));
        }
        if has_multisig_trailer(&bytes) {
            return Err(TransactionError::Malformed(
                "unsigned bytes already carry a multisig trailer".to_string(),
            ));
        }
        Ok(UnsignedTransaction(bytes))
    }

    /// Decode unsigned bytes from hex. Odd-length input is accepted the way
    /// [`apl_primitives::util::hex_to_bytes`] accepts it.
    pub fn from_hex(hex_str: &str) -> Result<Self, TransactionError> {
        Self::from_bytes(decode_hex(hex_str)?)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl SignedTransaction {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, TransactionError> {
        check_header_len(&bytes)?;
        Ok(SignedTransaction(bytes))
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, TransactionError> {
        Self::from_bytes(decode_hex(hex_str)?)
    }

    pub(crate) fn from_vec_unchecked(bytes: Vec<u8>) -> Self {
        SignedTransaction(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Lowercase hex, the form accepted by `broadcastTransaction`.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Building
// ---------------------------------------------------------------------------

fn required<T: Copy>(value: Option<T>, name: &str) -> Result<T, TransactionError> {
    value.ok_or_else(|| TransactionError::Validation(format!("{} is required", name)))
}

fn build_appendix(params: &TransactionParams) -> Result<Option<Appendix>, TransactionError> {
    match params.kind {
        TransactionKind::Payment => Ok(params.attachment.clone().map(Appendix::Message)),
        TransactionKind::ChildAccount => {
            if params.child_public_keys.is_empty() {
                return Err(TransactionError::Validation(
                    "child account transaction needs at least one child key".to_string(),
                ));
            }
            if params.attachment.is_some() {
                return Err(TransactionError::Validation(
                    "attachments are only supported on payments".to_string(),
                ));
            }
            Ok(Some(Appendix::ChildAccount {
                scope: params.address_scope,
                public_keys: params.child_public_keys.clone(),
            }))
        }
    }
}

/// Lay out an unsigned transaction.
///
/// # Arguments
/// * `params` - Transaction parameters. `fee`, a recipient or parent
///   address, a sender key source, the timestamp and both ecBlock fields
///   must be present.
///
/// # Returns
/// The unsigned bytes with a zeroed signature field, or `Validation` if a
/// required field is missing or an address fails its checksum.
pub fn build_unsigned(params: &TransactionParams) -> Result<UnsignedTransaction, TransactionError> {
    let fee = required(params.fee, "fee")?;
    let recipient = params
        .resolve_recipient()
        .ok_or_else(|| TransactionError::Validation("recipient or parent is required".to_string()))?;
    let recipient_id = reed_solomon::parse_account_id(recipient)
        .map_err(|e| TransactionError::Validation(format!("recipient: {}", e)))?;
    let sender_key = params.resolve_sender_key().ok_or_else(|| {
        TransactionError::Validation("a signer secret or sender public key is required".to_string())
    })?;
    let timestamp = required(params.timestamp, "timestamp")?;
    let ec_block_height = required(params.ec_block_height, "ecBlockHeight")?;
    let ec_block_id = required(params.ec_block_id, "ecBlockId")?;

    let appendix = build_appendix(params)?;
    let flags = match &appendix {
        Some(Appendix::Message(_)) => MESSAGE_FLAG,
        _ => 0,
    };
    let version = if params.is_multisig() { MULTI_SIG_VERSION } else { SINGLE_SIG_VERSION };

    let appendix_len = appendix.as_ref().map_or(0, Appendix::encoded_len);
    let mut w = AplWriter::with_capacity(HEADER_LEN + appendix_len);
    w.write_u8(params.kind.type_byte());
    w.write_u8((version << 4) | params.kind.subtype());
    w.write_u32_le(timestamp);
    w.write_u16_le(params.deadline.unwrap_or(DEFAULT_DEADLINE));
    w.write_bytes(sender_key.as_bytes());
    w.write_u64_le(recipient_id);
    w.write_u64_le(params.amount);
    w.write_u64_le(fee);
    w.write_bytes(&params.referenced_hash.unwrap_or([0u8; 32]));
    w.write_zeros(SIGNATURE_LEN);
    w.write_u32_le(flags);
    w.write_u32_le(ec_block_height);
    w.write_u64_le(ec_block_id);
    if let Some(appendix) = &appendix {
        appendix.write_to(&mut w)?;
    }

    debug!(
        kind = ?params.kind,
        version,
        len = w.len(),
        "built unsigned transaction"
    );
    Ok(UnsignedTransaction(w.into_bytes()))
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// One signer's entry in a multi-signature trailer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultisigEntry {
    /// First 8 bytes of the signer's public key.
    pub key_id: [u8; 8],
    pub signature: Signature,
}

/// Decoded transaction fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionFields {
    pub kind: TransactionKind,
    /// High nibble of the subtype byte.
    pub version: u8,
    /// Low nibble of the subtype byte.
    pub subtype: u8,
    pub timestamp: u32,
    pub deadline: u16,
    pub sender_public_key: PublicKey,
    pub sender_id: u64,
    pub sender_rs: String,
    pub recipient_id: u64,
    pub recipient_rs: String,
    pub amount: u64,
    pub fee: u64,
    pub referenced_hash: [u8; 32],
    /// `None` when the signature field is all zeros.
    pub signature: Option<Signature>,
    pub flags: u32,
    pub ec_block_height: u32,
    pub ec_block_id: u64,
    pub appendix: Option<Appendix>,
    /// Empty unless a `MSIG` trailer is present.
    pub multisig: Vec<MultisigEntry>,
    /// Length of header plus appendix; the trailer, if any, starts here.
    pub body_len: usize,
}

fn malformed(field: &'static str) -> impl Fn(apl_primitives::PrimitivesError) -> TransactionError {
    move |e| TransactionError::Malformed(format!("reading {}: {}", field, e))
}

fn read_trailer(r: &mut AplReader) -> Result<Vec<MultisigEntry>, TransactionError> {
    r.read_bytes(MULTISIG_MAGIC.len()).map_err(malformed("multisig magic"))?;
    r.read_bytes(4).map_err(malformed("multisig reserved bytes"))?;
    let count = r.read_u8().map_err(malformed("multisig count"))?;
    (0..count)
        .map(|_| -> Result<MultisigEntry, TransactionError> {
            let key_id = r.read_array::<8>().map_err(malformed("multisig key id"))?;
            let sig = r.read_bytes(SIGNATURE_LEN).map_err(malformed("multisig signature"))?;
            Ok(MultisigEntry { key_id, signature: Signature::from_bytes(sig)? })
        })
        .collect()
}

/// Decode a transaction.
///
/// Accepts unsigned, single-signed and multi-signed bytes. Account ids and
/// RS addresses of both parties are derived from the header.
///
/// # Returns
/// The decoded fields, or `Malformed` if the buffer is shorter than 176
/// bytes, the type is unknown, the appendix is truncated, or bytes remain
/// after the appendix and trailer.
pub fn parse(bytes: &[u8]) -> Result<TransactionFields, TransactionError> {
    check_header_len(bytes)?;
    let mut r = AplReader::new(bytes);

    let type_byte = r.read_u8().map_err(malformed("type"))?;
    let kind = TransactionKind::from_type_byte(type_byte).ok_or_else(|| {
        TransactionError::Malformed(format!("unsupported transaction type {}", type_byte))
    })?;
    let subtype_byte = r.read_u8().map_err(malformed("subtype"))?;
    let timestamp = r.read_u32_le().map_err(malformed("timestamp"))?;
    let deadline = r.read_u16_le().map_err(malformed("deadline"))?;
    let sender_public_key = PublicKey::from_bytes(r.read_bytes(32).map_err(malformed("sender"))?)?;
    let recipient_id = r.read_u64_le().map_err(malformed("recipient"))?;
    let amount = r.read_u64_le().map_err(malformed("amount"))?;
    let fee = r.read_u64_le().map_err(malformed("fee"))?;
    let referenced_hash = r.read_array::<32>().map_err(malformed("referenced hash"))?;
    let sig_bytes = r.read_bytes(SIGNATURE_LEN).map_err(malformed("signature"))?;
    let flags = r.read_u32_le().map_err(malformed("flags"))?;
    let ec_block_height = r.read_u32_le().map_err(malformed("ecBlockHeight"))?;
    let ec_block_id = r.read_u64_le().map_err(malformed("ecBlockId"))?;

    let signature = if sig_bytes.iter().all(|b| *b == 0) {
        None
    } else {
        Some(Signature::from_bytes(sig_bytes)?)
    };

    let appendix = match kind {
        TransactionKind::ChildAccount => Some(Appendix::read_child_account(&mut r)?),
        TransactionKind::Payment if flags & MESSAGE_FLAG != 0 => Some(Appendix::read_message(&mut r)?),
        TransactionKind::Payment => None,
    };
    let body_len = r.position();

    let multisig = if r.peek_matches(MULTISIG_MAGIC) { read_trailer(&mut r)? } else { Vec::new() };
    if r.remaining() != 0 {
        return Err(TransactionError::Malformed(format!(
            "{} unexpected trailing bytes",
            r.remaining()
        )));
    }

    let sender_id = sender_public_key.account_id();
    Ok(TransactionFields {
        kind,
        version: subtype_byte >> 4,
        subtype: subtype_byte & 0x0f,
        timestamp,
        deadline,
        sender_public_key,
        sender_id,
        sender_rs: reed_solomon::encode(sender_id),
        recipient_id,
        recipient_rs: reed_solomon::encode(recipient_id),
        amount,
        fee,
        referenced_hash,
        signature,
        flags,
        ec_block_height,
        ec_block_id,
        appendix,
        multisig,
        body_len,
    })
}
