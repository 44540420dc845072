use std::{path::PathBuf, time::Duration};

use color_eyre::eyre::{Result, eyre};
use directories::ProjectDirs;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::{domain::status::STATUS_TTL, infra::identity::DEFAULT_MAX_TTL};

/// Network name of the production Internet Computer.
pub const MAINNET: &str = "ic";

/// Internet Identity canister on mainnet.
pub const MAINNET_IDENTITY_CANISTER_ID: &str = "rdmx6-jaaaa-aaaaa-aaadq-cai";

const MAINNET_HOST: &str = "https://ic0.app";
const MAINNET_IDENTITY_PROVIDER: &str = "https://identity.ic0.app";
const LOCAL_HOST: &str = "http://127.0.0.1:4943";
const EXPLORER_TX_URL: &str = "https://explorer.kaspa.org/txs/";

const BACKEND_CANISTER_VARS: &[&str] = &[
    "CANISTER_ID_BACKEND",
    "CANISTER_ID_backend",
    "VITE_CANISTER_ID_backend",
];
const IDENTITY_CANISTER_VARS: &[&str] = &[
    "CANISTER_ID_INTERNET_IDENTITY",
    "CANISTER_ID_internet_identity",
    "VITE_CANISTER_ID_internet_identity",
];
const NETWORK_VAR: &str = "DFX_NETWORK";

/// Get the data directory for the application.
pub fn get_data_dir() -> PathBuf {
    if let Ok(s) = std::env::var("II_KASPA_WALLET_DATA") {
        PathBuf::from(s)
    } else if let Some(proj_dirs) = ProjectDirs::from("com", "ii-kaspa", "ii-kaspa-wallet") {
        proj_dirs.data_local_dir().to_path_buf()
    } else {
        PathBuf::from(".").join(".data")
    }
}

/// Where the ledger canister lives and who vouches for callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub network: String,
    pub host: String,
    pub canister_id: String,
    pub identity_provider: String,
}

impl EndpointConfig {
    pub fn is_mainnet(&self) -> bool {
        self.network == MAINNET
    }
}

/// Values given explicitly on the command line. They win over the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub network: Option<String>,
    pub host: Option<String>,
    pub canister_id: Option<String>,
    pub identity_canister_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: EndpointConfig,
    /// Lifetime requested for a new delegation.
    pub identity_max_ttl: Duration,
    pub status_ttl: Duration,
    /// How long the "copied" indicator stays on.
    pub copied_ttl: Duration,
    /// Wait before re-reading the balance after a send.
    pub refresh_delay: Duration,
}

impl Config {
    /// Resolve configuration once at startup.
    ///
    /// `env` looks up environment variables; it is a parameter so resolution
    /// stays deterministic under test.
    pub fn resolve<F>(overrides: &ConfigOverrides, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |explicit: &Option<String>, vars: &[&str]| {
            non_empty(explicit.clone())
                .or_else(|| vars.iter().find_map(|var| non_empty(env(var))))
        };

        let canister_id = lookup(&overrides.canister_id, BACKEND_CANISTER_VARS).ok_or_else(|| {
            eyre!(
                "No backend canister id: pass --canister-id or set {}",
                BACKEND_CANISTER_VARS[0]
            )
        })?;
        let identity_canister_id = lookup(&overrides.identity_canister_id, IDENTITY_CANISTER_VARS)
            .unwrap_or_else(|| MAINNET_IDENTITY_CANISTER_ID.to_string());

        let host_override = non_empty(overrides.host.clone());
        let network = lookup(&overrides.network, &[NETWORK_VAR])
            .unwrap_or_else(|| detect_network(host_override.as_deref()));

        let is_mainnet = network == MAINNET;
        let default_host = if is_mainnet { MAINNET_HOST } else { LOCAL_HOST };
        let host = host_override.unwrap_or_else(|| default_host.to_string());
        let identity_provider = if is_mainnet {
            MAINNET_IDENTITY_PROVIDER.to_string()
        } else {
            format!("http://{}.localhost:4943", identity_canister_id)
        };

        Ok(Self {
            endpoint: EndpointConfig {
                network,
                host,
                canister_id,
                identity_provider,
            },
            identity_max_ttl: DEFAULT_MAX_TTL,
            status_ttl: STATUS_TTL,
            copied_ttl: Duration::from_secs(2),
            refresh_delay: Duration::from_secs(2),
        })
    }

    /// Block explorer page for a transaction.
    pub fn explorer_url(&self, tx_id: &str) -> String {
        format!("{}{}", EXPLORER_TX_URL, tx_id)
    }
}

/// Non-local host means mainnet; no host at all means a local replica.
fn detect_network(host: Option<&str>) -> String {
    match host {
        Some(host) if !is_local_host(host) => MAINNET.to_string(),
        _ => "local".to_string(),
    }
}

fn is_local_host(host: &str) -> bool {
    let hostname = Url::parse(host)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_else(|| host.to_string());
    hostname.contains("localhost") || hostname.contains("127.0.0.1") || hostname == "[::1]"
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
