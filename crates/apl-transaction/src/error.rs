/// Error types for transaction operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// Required parameters are missing or contradictory.
    #[error("invalid transaction parameters: {0}")]
    Validation(String),
    /// A produced signature failed self-verification.
    #[error("signing error: {0}")]
    Signing(String),
    /// The byte buffer is too short or internally inconsistent.
    #[error("malformed transaction: {0}")]
    Malformed(String),
    /// An underlying primitives error (forwarded from `apl-primitives`).
    #[error("primitives error: {0}")]
    Primitives(#[from] apl_primitives::PrimitivesError),
}
