//! Apollo passphrase envelopes.
//!
//! Wraps a secret phrase for a remote co-signing service: the phrase is
//! AES-256-GCM encrypted under a random session key, and the session key
//! is ElGamal-encrypted against the service's secp521r1 public key.

mod error;
pub mod envelope;

pub use envelope::{open_passphrase, seal_passphrase, Envelope};
pub use error::EnvelopeError;
