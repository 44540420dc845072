//! Client for the Kaspa ledger canister.

use std::{fmt, ops::Deref, sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use strum::Display;
use tracing::debug;

use crate::{
    config::EndpointConfig,
    domain::{
        error::RemoteError,
        wallet::{Address, Balance, BuiltTransaction, TransactionReceipt},
    },
    infra::identity::Identity,
};

/// Timeout for a single canister call.
const CALL_TIMEOUT: Duration = Duration::from_secs(60);

const SENDER_HEADER: &str = "x-ic-sender";
const DELEGATION_HEADER: &str = "x-ic-delegation";
pub const ROOT_KEY_HEADER: &str = "x-ic-root-key-sha256";

/// Operations exposed by the ledger canister.
///
/// Fallible operations return [`RemoteError::Rejected`] with the canister's
/// own error text when it answers with its `err` variant.
#[async_trait]
pub trait LedgerService: Send + Sync {
    async fn generate_address(&self) -> Result<Address, RemoteError>;

    async fn get_balance(&self, address: &str) -> Result<Balance, RemoteError>;

    async fn send_transaction(
        &self,
        from: &str,
        to: &str,
        amount: u64,
    ) -> Result<TransactionReceipt, RemoteError>;

    /// Build and sign without broadcasting.
    async fn build_transaction(
        &self,
        from: &str,
        to: &str,
        amount: u64,
    ) -> Result<BuiltTransaction, RemoteError>;

    async fn broadcast_transaction(&self, serialized_tx: &str) -> Result<String, RemoteError>;

    async fn whoami(&self) -> Result<String, RemoteError>;

    async fn health(&self) -> Result<String, RemoteError>;
}

/// Authorized handle to the ledger canister for one identity and endpoint.
///
/// Replaced wholesale on every login and dropped on logout.
#[derive(Clone)]
pub struct RemoteHandle {
    service: Arc<dyn LedgerService>,
    network: String,
    principal: String,
}

impl RemoteHandle {
    pub fn new(
        service: Arc<dyn LedgerService>,
        network: impl Into<String>,
        principal: impl Into<String>,
    ) -> Self {
        Self {
            service,
            network: network.into(),
            principal: principal.into(),
        }
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn principal(&self) -> &str {
        &self.principal
    }
}

impl Deref for RemoteHandle {
    type Target = dyn LedgerService;

    fn deref(&self) -> &Self::Target {
        self.service.as_ref()
    }
}

impl fmt::Debug for RemoteHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteHandle")
            .field("network", &self.network)
            .field("principal", &self.principal)
            .finish_non_exhaustive()
    }
}

/// Candid-style `variant { ok; err }` result.
#[derive(Debug, Deserialize)]
enum Reply<T> {
    #[serde(rename = "ok")]
    Ok(T),
    #[serde(rename = "err")]
    Err(String),
}

#[derive(Debug, Serialize)]
struct CallRequest<'a> {
    method: &'a str,
    args: Value,
}

#[derive(Debug, Clone, Copy, Display)]
#[strum(serialize_all = "lowercase")]
enum CallKind {
    Call,
    Query,
}

/// HTTP client for the ledger canister.
pub struct HttpLedgerClient {
    client: reqwest::Client,
    host: String,
    canister_id: String,
    sender: String,
    delegation: String,
    root_key_fingerprint: Option<String>,
}

impl HttpLedgerClient {
    pub fn new(
        endpoint: &EndpointConfig,
        identity: &Identity,
        root_key_fingerprint: Option<String>,
    ) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder().timeout(CALL_TIMEOUT).build()?;
        Ok(Self {
            client,
            host: endpoint.host.trim_end_matches('/').to_string(),
            canister_id: endpoint.canister_id.clone(),
            sender: identity.principal.clone(),
            delegation: identity.delegation.clone(),
            root_key_fingerprint,
        })
    }

    async fn request<T: DeserializeOwned>(
        &self,
        kind: CallKind,
        method: &str,
        args: Value,
    ) -> Result<T, RemoteError> {
        let url = format!(
            "{}/api/v2/canister/{}/{}",
            self.host, self.canister_id, kind
        );
        debug!("Canister {} {} -> {}", kind, method, url);

        let mut request = self
            .client
            .post(&url)
            .header(SENDER_HEADER, &self.sender)
            .header(DELEGATION_HEADER, &self.delegation)
            .json(&CallRequest { method, args });
        if let Some(ref fingerprint) = self.root_key_fingerprint {
            request = request.header(ROOT_KEY_HEADER, fingerprint);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Transport(format!(
                "HTTP {} from {}: {}",
                status,
                method,
                body.trim()
            )));
        }

        Ok(response.json::<T>().await?)
    }

    async fn update<T: DeserializeOwned>(
        &self,
        method: &str,
        args: Value,
    ) -> Result<T, RemoteError> {
        match self.request::<Reply<T>>(CallKind::Call, method, args).await? {
            Reply::Ok(value) => Ok(value),
            Reply::Err(e) => Err(RemoteError::Rejected(e)),
        }
    }

    async fn query<T: DeserializeOwned>(&self, method: &str) -> Result<T, RemoteError> {
        self.request(CallKind::Query, method, json!([])).await
    }
}

#[async_trait]
impl LedgerService for HttpLedgerClient {
    async fn generate_address(&self) -> Result<Address, RemoteError> {
        self.update("generateAddress", json!([])).await
    }

    async fn get_balance(&self, address: &str) -> Result<Balance, RemoteError> {
        self.update("getBalance", json!([address])).await
    }

    async fn send_transaction(
        &self,
        from: &str,
        to: &str,
        amount: u64,
    ) -> Result<TransactionReceipt, RemoteError> {
        self.update("sendTransaction", json!([from, to, amount]))
            .await
    }

    async fn build_transaction(
        &self,
        from: &str,
        to: &str,
        amount: u64,
    ) -> Result<BuiltTransaction, RemoteError> {
        self.update("buildTransaction", json!([from, to, amount]))
            .await
    }

    async fn broadcast_transaction(&self, serialized_tx: &str) -> Result<String, RemoteError> {
        self.update("broadcastTransaction", json!([serialized_tx]))
            .await
    }

    async fn whoami(&self) -> Result<String, RemoteError> {
        self.query("whoami").await
    }

    async fn health(&self) -> Result<String, RemoteError> {
        self.query("health").await
    }
}
