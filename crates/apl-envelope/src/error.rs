/// Error types for envelope sealing and opening.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("{0}")]
    Primitives(#[from] apl_primitives::PrimitivesError),
    #[error("malformed envelope: {0}")]
    Malformed(String),
    #[error("envelope digest does not match the recovered passphrase")]
    DigestMismatch,
}
