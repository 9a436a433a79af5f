//! Error types for node API operations.

/// Errors that can occur when talking to an Apollo node.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Failed to serialize or deserialize data.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The node answered with an error code.
    #[error("request rejected ({code}): {description}")]
    Rejected {
        /// The node's error code, or the HTTP status for bare failures.
        code: i32,
        /// Human-readable error description.
        description: String,
    },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// The request cannot be sent as given.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Signing node-provided bytes failed.
    #[error("transaction error: {0}")]
    Transaction(#[from] apl_transaction::TransactionError),

    /// Sealing a passphrase failed.
    #[error("envelope error: {0}")]
    Envelope(#[from] apl_envelope::EnvelopeError),

    /// A key returned by the node could not be used.
    #[error("primitives error: {0}")]
    Primitives(#[from] apl_primitives::PrimitivesError),
}

impl ClientError {
    /// Map a transport error, separating timeouts from other failures.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::HttpError(err)
        }
    }
}
