#![deny(missing_docs)]

//! Apollo (APL) blockchain client SDK.
//!
//! Re-exports all Apollo SDK components for convenient single-crate usage:
//! key derivation, signatures and addresses (`primitives`), passphrase
//! envelopes (`envelope`), transaction building and signing
//! (`transaction`), and the node HTTP client (`client`).

pub use apl_primitives as primitives;
pub use apl_envelope as envelope;
pub use apl_transaction as transaction;
pub use apl_client as client;
