/// Unified error type for all primitives operations.
///
/// Covers byte-codec failures, address parsing, curve25519 key handling,
/// signing, and symmetric or ElGamal encryption.
#[derive(Debug, thiserror::Error)]
pub enum PrimitivesError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid utf-8: {0}")]
    InvalidUtf8(String),

    #[error("value {value} does not fit in {width} byte(s)")]
    ValueOutOfRange { value: u64, width: usize },

    #[error("unsupported integer width: {0}")]
    UnsupportedWidth(usize),

    #[error("invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("invalid account address: {0}")]
    InvalidAddress(String),

    #[error("signing failed: {0}")]
    SigningError(String),

    #[error("point not on curve")]
    PointNotOnCurve,

    #[error("encryption error: {0}")]
    EncryptionError(String),

    #[error("decryption error: {0}")]
    DecryptionError(String),

    #[error("unexpected end of data")]
    UnexpectedEof,
}

impl From<hex::FromHexError> for PrimitivesError {
    fn from(e: hex::FromHexError) -> Self {
        PrimitivesError::InvalidHex(e.to_string())
    }
}

impl From<std::string::FromUtf8Error> for PrimitivesError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        PrimitivesError::InvalidUtf8(e.to_string())
    }
}
