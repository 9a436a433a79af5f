//! Caller-facing transaction parameters.

use apl_primitives::ec::{PublicKey, SecretPhrase};

use crate::appendix::{AddressScope, Attachment};

/// Transaction kinds this crate can lay out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransactionKind {
    /// Ordinary payment (`sendMoney`).
    #[default]
    Payment,
    /// Registers child accounts under a parent account.
    ChildAccount,
}

impl TransactionKind {
    /// Wire value of the `type` byte.
    pub fn type_byte(self) -> u8 {
        match self {
            TransactionKind::Payment => 0,
            TransactionKind::ChildAccount => 10,
        }
    }

    /// Inverse of [`TransactionKind::type_byte`].
    pub fn from_type_byte(value: u8) -> Option<Self> {
        match value {
            0 => Some(TransactionKind::Payment),
            10 => Some(TransactionKind::ChildAccount),
            _ => None,
        }
    }

    /// Subtype (low nibble of the subtype byte).
    pub fn subtype(self) -> u8 {
        0
    }
}

/// Everything needed to build an unsigned transaction.
///
/// Secrets are only read to derive public keys and signatures; they are
/// never embedded in the produced bytes.
#[derive(Clone, Debug, Default)]
pub struct TransactionParams {
    pub kind: TransactionKind,
    /// Recipient RS address. Falls back to `parent` when absent.
    pub recipient: Option<String>,
    /// Parent account RS address.
    pub parent: Option<String>,
    pub amount: u64,
    /// Required.
    pub fee: Option<u64>,
    /// Minutes until expiry, 1440 when absent.
    pub deadline: Option<u16>,
    /// Epoch-relative seconds, normally filled from the blockchain state.
    pub timestamp: Option<u32>,
    pub ec_block_height: Option<u32>,
    pub ec_block_id: Option<u64>,
    /// Used when no secret is supplied, e.g. when signing happens elsewhere.
    pub sender_public_key: Option<PublicKey>,
    pub sender_secret: Option<SecretPhrase>,
    pub parent_secret: Option<SecretPhrase>,
    pub attachment: Option<Attachment>,
    pub child_public_keys: Vec<PublicKey>,
    pub address_scope: AddressScope,
    pub referenced_hash: Option<[u8; 32]>,
}

impl TransactionParams {
    /// Parameters for a payment of `amount` to `recipient` paying `fee`.
    pub fn payment(recipient: impl Into<String>, amount: u64, fee: u64) -> Self {
        TransactionParams {
            kind: TransactionKind::Payment,
            recipient: Some(recipient.into()),
            amount,
            fee: Some(fee),
            ..Default::default()
        }
    }

    /// Parameters registering `children` under the account at `parent`.
    pub fn child_account(parent: impl Into<String>, children: Vec<PublicKey>, fee: u64) -> Self {
        TransactionParams {
            kind: TransactionKind::ChildAccount,
            parent: Some(parent.into()),
            fee: Some(fee),
            child_public_keys: children,
            ..Default::default()
        }
    }

    pub fn with_sender_secret(mut self, secret: SecretPhrase) -> Self {
        self.sender_secret = Some(secret);
        self
    }

    pub fn with_parent_secret(mut self, secret: SecretPhrase) -> Self {
        self.parent_secret = Some(secret);
        self
    }

    pub fn with_sender_public_key(mut self, key: PublicKey) -> Self {
        self.sender_public_key = Some(key);
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_deadline(mut self, deadline: u16) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    pub fn with_address_scope(mut self, scope: AddressScope) -> Self {
        self.address_scope = scope;
        self
    }

    pub fn with_referenced_hash(mut self, hash: [u8; 32]) -> Self {
        self.referenced_hash = Some(hash);
        self
    }

    /// Set the timestamp and reference block in one call.
    pub fn with_chain_state(mut self, timestamp: u32, ec_block_height: u32, ec_block_id: u64) -> Self {
        self.timestamp = Some(timestamp);
        self.ec_block_height = Some(ec_block_height);
        self.ec_block_id = Some(ec_block_id);
        self
    }

    /// True for a payment whose parent and sender secrets are both present
    /// and differ. Child-account transactions are always single-signed.
    pub fn is_multisig(&self) -> bool {
        if self.kind == TransactionKind::ChildAccount {
            return false;
        }
        match (&self.parent_secret, &self.sender_secret) {
            (Some(parent), Some(sender)) => parent.as_bytes() != sender.as_bytes(),
            _ => false,
        }
    }

    /// Public key embedded in the header: sender secret, then parent
    /// secret, then the explicit sender key.
    pub fn resolve_sender_key(&self) -> Option<PublicKey> {
        self.sender_secret
            .as_ref()
            .or(self.parent_secret.as_ref())
            .map(SecretPhrase::public_key)
            .or(self.sender_public_key)
    }

    /// Recipient address: `recipient`, else `parent`.
    pub fn resolve_recipient(&self) -> Option<&str> {
        self.recipient.as_deref().or(self.parent.as_deref())
    }
}
