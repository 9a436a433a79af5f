//! Transaction appendices.
//!
//! Two appendix layouts follow the fixed header:
//!
//! Message attachment (payment transactions, flag bit `0x01` set):
//!
//! | Field   | Size               |
//! |---------|--------------------|
//! | version | 1 byte (always 1)  |
//! | length  | 4 bytes (LE); bit 31 set for UTF-8 text |
//! | payload | `length` bytes, at most 1000 |
//!
//! Child account list (child-account transactions):
//!
//! | Field       | Size               |
//! |-------------|--------------------|
//! | version     | 1 byte (always 1)  |
//! | scope       | 1 byte             |
//! | count       | 2 bytes (LE)       |
//! | public keys | `count` x 32 bytes |

use apl_primitives::ec::PublicKey;
use apl_primitives::util::{AplReader, AplWriter};

use crate::TransactionError;

/// Appendix format version.
pub const APPENDIX_VERSION: u8 = 1;

/// Largest attachment payload accepted by the network.
pub const MAX_ATTACHMENT_LEN: usize = 1000;

/// Length-field bit marking a text attachment.
const TEXT_FLAG: u32 = 0x8000_0000;

/// A payment attachment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Attachment {
    /// UTF-8 text.
    Text(String),
    /// Arbitrary bytes.
    Binary(Vec<u8>),
}

impl Attachment {
    fn payload(&self) -> &[u8] {
        match self {
            Attachment::Text(text) => text.as_bytes(),
            Attachment::Binary(bytes) => bytes,
        }
    }
}

/// Which accounts a child account may transact with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AddressScope {
    External = 0,
    #[default]
    InFamily = 1,
    Custom = 2,
}

impl AddressScope {
    fn from_u8(value: u8) -> Result<Self, TransactionError> {
        match value {
            0 => Ok(AddressScope::External),
            1 => Ok(AddressScope::InFamily),
            2 => Ok(AddressScope::Custom),
            other => Err(TransactionError::Malformed(format!("unknown address scope {}", other))),
        }
    }
}

/// A decoded or to-be-encoded appendix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Appendix {
    Message(Attachment),
    ChildAccount {
        scope: AddressScope,
        public_keys: Vec<PublicKey>,
    },
}

impl Appendix {
    /// Append the encoded appendix to `writer`.
    ///
    /// # Returns
    /// `Validation` if an attachment exceeds 1000 bytes or a child list exceeds 65535 keys.
    pub fn write_to(&self, writer: &mut AplWriter) -> Result<(), TransactionError> {
        match self {
            Appendix::Message(attachment) => {
                let payload = attachment.payload();
                if payload.len() > MAX_ATTACHMENT_LEN {
                    return Err(TransactionError::Validation(format!(
                        "attachment is {} bytes, limit is {}",
                        payload.len(),
                        MAX_ATTACHMENT_LEN
                    )));
                }
                let mut length = payload.len() as u32;
                if matches!(attachment, Attachment::Text(_)) {
                    length |= TEXT_FLAG;
                }
                writer.write_u8(APPENDIX_VERSION);
                writer.write_u32_le(length);
                writer.write_bytes(payload);
            }
            Appendix::ChildAccount { scope, public_keys } => {
                let count = u16::try_from(public_keys.len()).map_err(|_| {
                    TransactionError::Validation(format!(
                        "{} child keys exceed the 65535 limit",
                        public_keys.len()
                    ))
                })?;
                writer.write_u8(APPENDIX_VERSION);
                writer.write_u8(*scope as u8);
                writer.write_u16_le(count);
                for key in public_keys {
                    writer.write_bytes(key.as_bytes());
                }
            }
        }
        Ok(())
    }

    /// Encoded length in bytes.
    pub fn encoded_len(&self) -> usize {
        match self {
            Appendix::Message(attachment) => 5 + attachment.payload().len(),
            Appendix::ChildAccount { public_keys, .. } => 4 + 32 * public_keys.len(),
        }
    }

    /// Read a message attachment.
    pub fn read_message(reader: &mut AplReader) -> Result<Self, TransactionError> {
        read_version(reader)?;
        let length = reader.read_u32_le().map_err(eof("attachment length"))?;
        let is_text = length & TEXT_FLAG != 0;
        let len = (length & !TEXT_FLAG) as usize;
        if len > MAX_ATTACHMENT_LEN {
            return Err(TransactionError::Malformed(format!(
                "attachment length {} exceeds {}",
                len, MAX_ATTACHMENT_LEN
            )));
        }
        let payload = reader.read_bytes(len).map_err(eof("attachment payload"))?;
        let attachment = if is_text {
            let text = String::from_utf8(payload.to_vec())
                .map_err(|e| TransactionError::Malformed(format!("attachment text: {}", e)))?;
            Attachment::Text(text)
        } else {
            Attachment::Binary(payload.to_vec())
        };
        Ok(Appendix::Message(attachment))
    }

    /// Read a child account list.
    pub fn read_child_account(reader: &mut AplReader) -> Result<Self, TransactionError> {
        read_version(reader)?;
        let scope = AddressScope::from_u8(reader.read_u8().map_err(eof("address scope"))?)?;
        let count = reader.read_u16_le().map_err(eof("child count"))?;
        let public_keys = (0..count)
            .map(|_| -> Result<PublicKey, TransactionError> {
                let bytes = reader.read_bytes(32).map_err(eof("child public key"))?;
                Ok(PublicKey::from_bytes(bytes)?)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Appendix::ChildAccount { scope, public_keys })
    }
}

fn read_version(reader: &mut AplReader) -> Result<(), TransactionError> {
    let version = reader.read_u8().map_err(eof("appendix version"))?;
    if version != APPENDIX_VERSION {
        return Err(TransactionError::Malformed(format!(
            "unsupported appendix version {}",
            version
        )));
    }
    Ok(())
}

fn eof(field: &'static str) -> impl Fn(apl_primitives::PrimitivesError) -> TransactionError {
    move |e| TransactionError::Malformed(format!("reading {}: {}", field, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(appendix: &Appendix) -> Vec<u8> {
        let mut w = AplWriter::new();
        appendix.write_to(&mut w).unwrap();
        w.into_bytes()
    }

    #[test]
    fn test_text_attachment_layout() {
        let bytes = encode(&Appendix::Message(Attachment::Text("hi".into())));
        assert_eq!(bytes, vec![0x01, 0x02, 0x00, 0x00, 0x80, b'h', b'i']);
    }

    #[test]
    fn test_binary_attachment_layout() {
        let bytes = encode(&Appendix::Message(Attachment::Binary(vec![0xde, 0xad])));
        assert_eq!(bytes, vec![0x01, 0x02, 0x00, 0x00, 0x00, 0xde, 0xad]);
    }

    #[test]
    fn test_attachment_limit() {
        let ok = Appendix::Message(Attachment::Binary(vec![0u8; MAX_ATTACHMENT_LEN]));
        assert_eq!(encode(&ok).len(), ok.encoded_len());

        let too_big = Appendix::Message(Attachment::Text("x".repeat(MAX_ATTACHMENT_LEN + 1)));
        let mut w = AplWriter::new();
        assert!(matches!(too_big.write_to(&mut w), Err(TransactionError::Validation(_))));
    }

    #[test]
    fn test_child_account_layout() {
        let key = PublicKey::from_bytes(&[7u8; 32]).unwrap();
        let appendix = Appendix::ChildAccount {
            scope: AddressScope::InFamily,
            public_keys: vec![key, key],
        };
        let bytes = encode(&appendix);
        assert_eq!(&bytes[..4], &[0x01, 0x01, 0x02, 0x00]);
        assert_eq!(bytes.len(), 4 + 64);
        assert_eq!(bytes.len(), appendix.encoded_len());

        let mut r = AplReader::new(&bytes);
        assert_eq!(Appendix::read_child_account(&mut r).unwrap(), appendix);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_read_message_text_and_binary() {
        for appendix in [
            Appendix::Message(Attachment::Text("{\"text\":\"Text in attachment\"}".into())),
            Appendix::Message(Attachment::Binary(vec![1, 2, 3])),
        ] {
            let bytes = encode(&appendix);
            let mut r = AplReader::new(&bytes);
            assert_eq!(Appendix::read_message(&mut r).unwrap(), appendix);
        }
    }

    #[test]
    fn test_read_truncated_appendix() {
        let mut r = AplReader::new(&[0x01, 0x05, 0x00, 0x00, 0x00, 0xaa]);
        assert!(matches!(Appendix::read_message(&mut r), Err(TransactionError::Malformed(_))));
        let mut r = AplReader::new(&[0x02, 0x00, 0x00, 0x00, 0x00]);
        assert!(matches!(Appendix::read_message(&mut r), Err(TransactionError::Malformed(_))));
    }
}
