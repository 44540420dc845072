//! Builds authorized handles to the ledger canister.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::{
    config::EndpointConfig,
    domain::error::{RemoteError, WalletError},
    infra::{
        identity::Identity,
        ledger::{HttpLedgerClient, LedgerService, RemoteHandle},
    },
};

const STATUS_TIMEOUT: Duration = Duration::from_secs(15);

/// Transport used by [`SessionFactory`].
#[async_trait]
pub trait Connector: Send + Sync {
    /// Fetch the replica's root key. Only needed off mainnet.
    async fn fetch_root_key(&self, endpoint: &EndpointConfig) -> Result<Vec<u8>, RemoteError>;

    fn connect(
        &self,
        identity: &Identity,
        endpoint: &EndpointConfig,
        root_key: Option<&[u8]>,
    ) -> Result<Arc<dyn LedgerService>, RemoteError>;
}

#[derive(Debug, Deserialize)]
struct ReplicaStatus {
    root_key: String,
}

/// Connector speaking HTTP to a replica or boundary node.
pub struct HttpConnector {
    client: reqwest::Client,
}

impl HttpConnector {
    pub fn new() -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder().timeout(STATUS_TIMEOUT).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Connector for HttpConnector {
    async fn fetch_root_key(&self, endpoint: &EndpointConfig) -> Result<Vec<u8>, RemoteError> {
        let url = format!("{}/api/v2/status", endpoint.host.trim_end_matches('/'));
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(RemoteError::Transport(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }
        let status: ReplicaStatus = response.json().await?;
        hex::decode(status.root_key.trim())
            .map_err(|e| RemoteError::Transport(format!("malformed root key: {e}")))
    }

    fn connect(
        &self,
        identity: &Identity,
        endpoint: &EndpointConfig,
        root_key: Option<&[u8]>,
    ) -> Result<Arc<dyn LedgerService>, RemoteError> {
        let fingerprint = root_key.map(root_key_fingerprint);
        let client = HttpLedgerClient::new(endpoint, identity, fingerprint)?;
        Ok(Arc::new(client))
    }
}

pub fn root_key_fingerprint(root_key: &[u8]) -> String {
    hex::encode(Sha256::digest(root_key))
}

/// Produces a [`RemoteHandle`] for an identity, or nothing at all.
pub struct SessionFactory<C> {
    connector: C,
}

impl<C: Connector> SessionFactory<C> {
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    /// Build a handle bound to `endpoint`.
    ///
    /// Off mainnet the root key is fetched exactly once, before connecting.
    pub async fn create_handle(
        &self,
        identity: &Identity,
        endpoint: &EndpointConfig,
    ) -> Result<RemoteHandle, WalletError> {
        let root_key = if endpoint.is_mainnet() {
            None
        } else {
            info!("Fetching root key from {}", endpoint.host);
            let key = self
                .connector
                .fetch_root_key(endpoint)
                .await
                .map_err(|e| WalletError::TrustBootstrap(e.to_string()))?;
            if key.is_empty() {
                return Err(WalletError::TrustBootstrap(
                    "replica returned an empty root key".to_string(),
                ));
            }
            Some(key)
        };

        let service = self
            .connector
            .connect(identity, endpoint, root_key.as_deref())
            .map_err(|e| WalletError::Auth(e.to_string()))?;

        info!(
            "Connected to canister {} on {} as {}",
            endpoint.canister_id, endpoint.network, identity.principal
        );
        Ok(RemoteHandle::new(
            service,
            endpoint.network.clone(),
            identity.principal.clone(),
        ))
    }
}
