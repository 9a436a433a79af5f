//! Apollo blockchain cryptographic primitives.
//!
//! This crate provides the foundational building blocks for the Apollo SDK:
//! - Byte codecs: hex, UTF-8, fixed-width little-endian integers, cursors
//! - SHA-256 and multi-part hashing
//! - Reed-Solomon account addresses (`APL-XXXX-XXXX-XXXX-XXXXX`)
//! - Curve25519 key derivation, deterministic signatures and key agreement
//! - AES-256-CBC account messages, AES-256-GCM session keys and secp521r1
//!   ElGamal encryption

pub mod hash;
pub mod util;
pub mod reed_solomon;
pub mod ec;

mod error;
pub use error::PrimitivesError;
