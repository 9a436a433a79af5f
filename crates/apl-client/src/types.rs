//! Node API request and response structures.

use std::collections::BTreeMap;

use apl_primitives::ec::SecretPhrase;
use apl_transaction::SignedTransaction;
use serde::{Deserialize, Deserializer, Serialize};

/// Accept a u64 sent either as a JSON number or as a decimal string.
///
/// The node serializes 64-bit ids as strings to keep JavaScript clients
/// exact.
fn u64_from_str_or_num<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Str(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Str(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

/// Chain state used to fill the timestamp and reference-block fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockchainState {
    /// Current transaction timestamp, seconds since the Apollo epoch.
    pub tx_timestamp: u32,
    /// Height of the economic-clustering reference block.
    pub ec_block_height: u32,
    /// Id of the economic-clustering reference block.
    #[serde(deserialize_with = "u64_from_str_or_num")]
    pub ec_block_id: u64,
}

/// Body of a broadcast request.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct BroadcastRequest<'a> {
    /// Signed transaction bytes as lowercase hex.
    pub tx: &'a str,
}

/// Response to a broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastResponse {
    /// Id of the accepted transaction.
    #[serde(default)]
    pub transaction: Option<String>,
    /// Full hash of the accepted transaction.
    #[serde(default)]
    pub full_hash: Option<String>,
    /// Error code, present on rejection.
    #[serde(default)]
    pub error_code: Option<i32>,
    /// Error description, present on rejection.
    #[serde(default)]
    pub error_description: Option<String>,
}

/// The node's ElGamal public key as hex affine coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElGamalKeyResponse {
    /// x coordinate, hex.
    #[serde(rename = "ElGamalX")]
    pub el_gamal_x: String,
    /// y coordinate, hex.
    #[serde(rename = "ElGamalY")]
    pub el_gamal_y: String,
}

/// A node API call, posted as a form to `/apl?requestType=<request_type>`.
///
/// When a secret is attached its public key is always sent. The secret
/// itself only leaves the client sealed for the node's ElGamal key, and not
/// at all for `doNotSign` requests.
#[derive(Debug, Clone, Default)]
pub struct ApiRequest {
    /// Node request type, e.g. `sendMoney`.
    pub request_type: String,
    /// Form parameters other than the secret phrase and public key.
    pub params: BTreeMap<String, String>,
    /// Account secret used for `publicKey` and, when the node signs, `secretPhrase`.
    pub secret: Option<SecretPhrase>,
}

impl ApiRequest {
    /// A request of the given type with no parameters.
    pub fn new(request_type: impl Into<String>) -> Self {
        Self { request_type: request_type.into(), ..Default::default() }
    }

    /// Add or replace a form parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    /// Attach the account secret.
    pub fn with_secret(mut self, secret: SecretPhrase) -> Self {
        self.secret = Some(secret);
        self
    }

    /// Whether the node is asked to return unsigned bytes.
    pub fn is_do_not_sign(&self) -> bool {
        self.params.get("doNotSign").is_some_and(|v| v != "0" && v != "false")
    }
}

/// Response to a `doNotSign` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedTransactionResponse {
    /// Unsigned transaction bytes as hex.
    pub unsigned_transaction_bytes: String,
    /// The node's JSON view of the transaction.
    #[serde(default, rename = "transactionJSON")]
    pub transaction_json: Option<serde_json::Value>,
}

/// Node-built transaction signed on the client.
#[derive(Debug, Clone)]
pub struct OfflineSignedTransaction {
    /// Signed bytes, ready to broadcast.
    pub transaction_bytes: SignedTransaction,
    /// The unsigned hex the node returned.
    pub unsigned_transaction_bytes: String,
    /// The node's JSON view with `signature` filled in.
    pub transaction_json: Option<serde_json::Value>,
    /// The 64-byte signature as hex.
    pub signature: String,
}

/// Error fields the node may attach to any response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error_code: Option<i32>,
    #[serde(default)]
    pub error_description: Option<String>,
}
