#![deny(missing_docs)]

//! # apl-client
//!
//! HTTP client for the Apollo node endpoints a signing client needs:
//! the current blockchain state for reference-block fields, transaction
//! broadcast, and the node's ElGamal public key for sealing passphrases.
//! Generic `/apl?requestType=` calls can be sent with the passphrase sealed
//! for the node, or with `doNotSign` so the returned bytes are signed
//! locally.
//!
//! # Example
//!
//! ```no_run
//! use apl_client::{AplClient, ClientConfig};
//!
//! # async fn run() -> Result<(), apl_client::ClientError> {
//! let client = AplClient::new(ClientConfig {
//!     base_url: "http://localhost:7876".to_string(),
//!     ..Default::default()
//! })?;
//! let state = client.blockchain_state().await?;
//! println!("ecBlockHeight = {}", state.ec_block_height);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod types;


pub use client::AplClient;
pub use config::ClientConfig;
pub use error::ClientError;
pub use types::{
    ApiRequest, BlockchainState, BroadcastResponse, ElGamalKeyResponse, OfflineSignedTransaction,
    UnsignedTransactionResponse,
};
