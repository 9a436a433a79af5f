//! Apollo transaction building, signing, and parsing.
//!
//! Transactions use a fixed 176-byte little-endian header followed by a
//! type-specific appendix and, for multi-signature transactions, a trailing
//! `MSIG` block. See [`transaction`] for the exact layout.

pub mod appendix;
pub mod params;
pub mod signing;
pub mod transaction;

mod error;
pub use appendix::{AddressScope, Appendix, Attachment};
pub use error::TransactionError;
pub use params::{TransactionKind, TransactionParams};
pub use signing::{
    generate_transaction_bytes, sign_multi, sign_single, sign_unsigned_hex, verify_multi,
    verify_single,
};
pub use transaction::{
    build_unsigned, parse, MultisigEntry, SignedTransaction, TransactionFields,
    UnsignedTransaction,
};

#[cfg(test)]
mod tests;
