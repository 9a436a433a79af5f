//! Apollo node HTTP client.

use apl_envelope::seal_passphrase;
use apl_primitives::ec::{ElGamalPublicKey, SecretPhrase};
use apl_transaction::transaction::{SIGNATURE_LEN, SIGNATURE_OFFSET};
use apl_transaction::{sign_unsigned_hex, SignedTransaction, TransactionParams};
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::types::{
    ApiRequest, BlockchainState, BroadcastRequest, BroadcastResponse, ElGamalKeyResponse,
    ErrorBody, OfflineSignedTransaction, UnsignedTransactionResponse,
};

const BLOCKCHAIN_STATE_PATH: &str = "/rest/v2/state/blockchain";
const BROADCAST_PATH: &str = "/rest/v2/transaction";
const API_PATH: &str = "/apl";
const EL_GAMAL_KEY_PATH: &str = "/apl?requestType=getElGamalPublicKey";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";

/// HTTP client for an Apollo node.
#[derive(Debug, Clone)]
pub struct AplClient {
    /// Client configuration.
    config: ClientConfig,
    /// Underlying HTTP client.
    client: reqwest::Client,
}

impl AplClient {
    /// Create a client with the given configuration.
    ///
    /// # Returns
    /// `HttpError` if the TLS backend cannot be initialised.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    /// Create a client for the node named by `APL_SERVER`.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(ClientConfig::from_env())
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Read a JSON body, surfacing node error codes and non-2xx statuses
    /// as `Rejected`.
    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
        let status = resp.status();
        let body = resp.text().await.map_err(ClientError::from_transport)?;

        let error: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
        if let Some(code) = error.error_code {
            return Err(ClientError::Rejected {
                code,
                description: error.error_description.unwrap_or_else(|| "rejected".to_string()),
            });
        }
        if !status.is_success() {
            return Err(ClientError::Rejected {
                code: i32::from(status.as_u16()),
                description: body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch the current timestamp and economic-clustering block.
    pub async fn blockchain_state(&self) -> Result<BlockchainState, ClientError> {
        let url = self.url(BLOCKCHAIN_STATE_PATH);
        debug!(%url, "fetching blockchain state");

        let resp = self.client.get(&url).send().await.map_err(ClientError::from_transport)?;
        Self::decode(resp).await
    }

    /// Submit signed transaction bytes.
    ///
    /// # Returns
    /// The node's response, or `Rejected` if it carries an error code.
    pub async fn broadcast(&self, tx: &SignedTransaction) -> Result<BroadcastResponse, ClientError> {
        let url = self.url(BROADCAST_PATH);
        let tx_hex = tx.to_hex();
        debug!(%url, len = tx.as_bytes().len(), "broadcasting transaction");

        let resp = self
            .client
            .post(&url)
            .json(&BroadcastRequest { tx: &tx_hex })
            .send()
            .await
            .map_err(ClientError::from_transport)?;

        match Self::decode::<BroadcastResponse>(resp).await {
            Ok(response) => Ok(response),
            Err(ClientError::Rejected { code, description }) => {
                warn!(code, %description, "broadcast rejected");
                Err(ClientError::Rejected { code, description })
            }
            Err(e) => Err(e),
        }
    }

    /// Fetch the node's ElGamal public key.
    pub async fn el_gamal_public_key(&self) -> Result<ElGamalPublicKey, ClientError> {
        let url = self.url(EL_GAMAL_KEY_PATH);
        debug!(%url, "fetching ElGamal public key");

        let resp = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .send()
            .await
            .map_err(ClientError::from_transport)?;
        let key: ElGamalKeyResponse = Self::decode(resp).await?;
        Ok(ElGamalPublicKey::from_hex_coordinates(&key.el_gamal_x, &key.el_gamal_y)?)
    }

    /// Seal a passphrase for this node, fetching its ElGamal key first.
    ///
    /// No retry is attempted if the fetch fails.
    pub async fn seal_passphrase(&self, secret: &SecretPhrase) -> Result<String, ClientError> {
        let key = self.el_gamal_public_key().await?;
        Ok(seal_passphrase(secret, &key)?)
    }

    /// Fill the timestamp and reference-block fields that are still unset.
    ///
    /// Makes no request when all three are already present.
    pub async fn fill_chain_state(&self, params: &mut TransactionParams) -> Result<(), ClientError> {
        if params.timestamp.is_some()
            && params.ec_block_height.is_some()
            && params.ec_block_id.is_some()
        {
            return Ok(());
        }
        let state = self.blockchain_state().await?;
        params.timestamp.get_or_insert(state.tx_timestamp);
        params.ec_block_height.get_or_insert(state.ec_block_height);
        params.ec_block_id.get_or_insert(state.ec_block_id);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Node-assisted requests
    // -----------------------------------------------------------------------

    /// Post a request to `/apl?requestType=<type>`.
    ///
    /// With a secret attached, `publicKey` is added. Unless the request is
    /// `doNotSign`, the secret is sealed for the node's ElGamal key and sent
    /// as `secretPhrase` so the node can sign.
    ///
    /// # Returns
    /// The node's JSON response, `Rejected` if it carries an error code, or
    /// `InvalidRequest` if the request type is empty.
    pub async fn send(&self, request: &ApiRequest) -> Result<serde_json::Value, ClientError> {
        if request.request_type.trim().is_empty() {
            return Err(ClientError::InvalidRequest("undefined request type".to_string()));
        }

        let mut form = request.params.clone();
        if let Some(secret) = &request.secret {
            form.insert("publicKey".to_string(), secret.public_key().to_hex());
            if request.is_do_not_sign() {
                form.remove("secretPhrase");
            } else {
                form.insert("secretPhrase".to_string(), self.seal_passphrase(secret).await?);
            }
        }

        let url = self.url(API_PATH);
        debug!(%url, request_type = %request.request_type, "sending node request");

        let resp = self
            .client
            .post(&url)
            .query(&[("requestType", request.request_type.as_str())])
            .form(&form)
            .send()
            .await
            .map_err(ClientError::from_transport)?;
        Self::decode(resp).await
    }

    /// Ask the node to build the transaction without signing or
    /// broadcasting it (`doNotSign=1`, `broadcast=false`).
    pub async fn send_not_sign(
        &self,
        request: &ApiRequest,
    ) -> Result<UnsignedTransactionResponse, ClientError> {
        let request = request.clone().param("doNotSign", 1).param("broadcast", false);
        let value = self.send(&request).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Have the node build the transaction, then sign the returned bytes
    /// locally with the request's secret.
    ///
    /// Nothing is broadcast; see [`AplClient::broadcast_with_offline_sign`].
    ///
    /// # Returns
    /// The signed bytes and the node's JSON view with the signature set, or
    /// `InvalidRequest` if no secret is attached.
    pub async fn send_with_offline_sign(
        &self,
        request: &ApiRequest,
    ) -> Result<OfflineSignedTransaction, ClientError> {
        let secret = request.secret.as_ref().ok_or_else(|| {
            ClientError::InvalidRequest("offline signing needs a secret".to_string())
        })?;
        let response = self.send_not_sign(request).await?;
        Self::sign_offline(response, secret)
    }

    /// [`AplClient::send_with_offline_sign`] followed by [`AplClient::broadcast`].
    pub async fn broadcast_with_offline_sign(
        &self,
        request: &ApiRequest,
    ) -> Result<BroadcastResponse, ClientError> {
        let signed = self.send_with_offline_sign(request).await?;
        self.broadcast(&signed.transaction_bytes).await
    }

    fn sign_offline(
        response: UnsignedTransactionResponse,
        secret: &SecretPhrase,
    ) -> Result<OfflineSignedTransaction, ClientError> {
        let signed = sign_unsigned_hex(&response.unsigned_transaction_bytes, secret)?;
        let signature = apl_primitives::util::bytes_to_hex(
            &signed.as_bytes()[SIGNATURE_OFFSET..SIGNATURE_OFFSET + SIGNATURE_LEN],
        );

        let transaction_json = response.transaction_json.map(|mut json| {
            if let Some(fields) = json.as_object_mut() {
                fields.insert("signature".to_string(), serde_json::Value::String(signature.clone()));
            }
            json
        });

        Ok(OfflineSignedTransaction {
            transaction_bytes: signed,
            unsigned_transaction_bytes: response.unsigned_transaction_bytes,
            transaction_json,
            signature,
        })
    }
}
