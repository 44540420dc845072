//! Delegated identity lifecycle: restore, login, logout.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;
use axum::{
    Router,
    extract::{Query, State},
    response::Html,
    routing::get,
};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tokio::{
    net::TcpListener,
    sync::{Notify, oneshot},
};
use tracing::{debug, info, warn};

use crate::{domain::error::WalletError, infra::desktop::open_url, infra::store::Store};

/// Default lifetime requested for a delegation (7 days).
pub const DEFAULT_MAX_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// How long the loopback flow waits for the provider to redirect back.
const CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

const CALLBACK_PATH: &str = "/callback";

/// Delegated credential issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub principal: String,
    /// Opaque delegation chain, forwarded to the canister as-is.
    pub delegation: String,
    /// Expiry in nanoseconds since the Unix epoch.
    pub expires_at_ns: u64,
}

impl Identity {
    pub fn is_expired_at(&self, now_ns: u64) -> bool {
        now_ns >= self.expires_at_ns
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_ns())
    }
}

pub fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos()
        .min(u64::MAX as u128) as u64
}

/// Result of an interactive login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated(Identity),
    Failed(String),
}

/// External identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Run the provider's interactive flow until it reports success or failure.
    async fn authenticate(&self, provider_url: &str, max_ttl: Duration)
    -> Result<Identity, String>;

    /// Tell the provider the delegation is no longer used.
    async fn revoke(&self, identity: &Identity) -> Result<(), String>;
}

/// Owns the cached identity and its persisted copy.
pub struct IdentityManager<P> {
    provider: P,
    store: Store,
    identity: Mutex<Option<Identity>>,
}

impl<P: IdentityProvider> IdentityManager<P> {
    pub fn new(provider: P, store: Store) -> Self {
        Self {
            provider,
            store,
            identity: Mutex::new(None),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<Identity>> {
        self.identity.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Restore a persisted identity. Returns whether it is still valid.
    pub fn initialize(&self) -> Result<bool, WalletError> {
        let stored = self
            .store
            .load_identity()
            .map_err(|e| WalletError::Init(e.to_string()));
        let stored = match stored {
            Ok(stored) => stored,
            Err(e) => {
                *self.slot() = None;
                return Err(e);
            }
        };

        match stored {
            Some(identity) if !identity.is_expired() => {
                info!("Restored identity {}", identity.principal);
                *self.slot() = Some(identity);
                Ok(true)
            }
            Some(identity) => {
                info!("Stored identity {} has expired", identity.principal);
                if let Err(e) = self.store.clear_identity() {
                    warn!("Failed to clear expired identity: {}", e);
                }
                *self.slot() = None;
                Ok(false)
            }
            None => {
                *self.slot() = None;
                Ok(false)
            }
        }
    }

    /// Authenticate with the provider. Reentrancy is the caller's concern.
    pub async fn login(&self, provider_url: &str, max_ttl: Duration) -> LoginOutcome {
        match self.provider.authenticate(provider_url, max_ttl).await {
            Ok(identity) => {
                if let Err(e) = self.store.save_identity(&identity) {
                    warn!("Failed to persist identity: {}", e);
                }
                info!("Authenticated as {}", identity.principal);
                *self.slot() = Some(identity.clone());
                LoginOutcome::Authenticated(identity)
            }
            Err(reason) => {
                warn!("Authentication failed: {}", reason);
                *self.slot() = None;
                LoginOutcome::Failed(reason)
            }
        }
    }

    /// Drop the identity. The manager is unauthenticated afterwards even when
    /// an error is returned.
    pub async fn logout(&self) -> Result<(), WalletError> {
        let previous = self.slot().take();
        let mut errors = Vec::new();

        if let Err(e) = self.store.clear_identity() {
            errors.push(e.to_string());
        }
        if let Some(identity) = previous
            && let Err(e) = self.provider.revoke(&identity).await
        {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(WalletError::Logout(errors.join("; ")))
        }
    }

    pub fn identity(&self) -> Option<Identity> {
        self.slot().clone()
    }
}

/// Login through the provider's web page with a loopback redirect.
///
/// The provider is opened with `callback=http://127.0.0.1:<port>/callback`
/// and is expected to redirect there with `principal`, `delegation` and
/// `expiration` on success or `error` on failure.
pub struct LoopbackIdentityProvider {
    timeout: Duration,
}

impl Default for LoopbackIdentityProvider {
    fn default() -> Self {
        Self {
            timeout: CALLBACK_TIMEOUT,
        }
    }
}

#[async_trait]
impl IdentityProvider for LoopbackIdentityProvider {
    async fn authenticate(
        &self,
        provider_url: &str,
        max_ttl: Duration,
    ) -> Result<Identity, String> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| format!("cannot listen for callback: {e}"))?;
        let port = listener.local_addr().map_err(|e| e.to_string())?.port();
        let callback = format!("http://127.0.0.1:{}{}", port, CALLBACK_PATH);
        let url = authorize_url(provider_url, &callback, max_ttl)?;

        info!("Opening identity provider: {}", url);
        if let Err(e) = open_url(url.as_str()) {
            warn!("Could not open browser ({}); visit {} manually", e, url);
        }

        tokio::time::timeout(self.timeout, wait_for_callback(listener))
            .await
            .map_err(|_| "timed out waiting for the identity provider".to_string())?
    }

    async fn revoke(&self, _identity: &Identity) -> Result<(), String> {
        // Delegations are bearer credentials that simply expire.
        Ok(())
    }
}

fn authorize_url(provider_url: &str, callback: &str, max_ttl: Duration) -> Result<Url, String> {
    let mut url = Url::parse(provider_url).map_err(|e| format!("bad provider url: {e}"))?;
    url.query_pairs_mut()
        .append_pair("callback", callback)
        .append_pair("max_time_to_live", &max_ttl.as_nanos().to_string());
    url.set_fragment(Some("authorize"));
    Ok(url)
}

const LOGIN_COMPLETE_PAGE: &str =
    "<html><body><p>Login complete. You can return to the wallet.</p></body></html>";
const LOGIN_FAILED_PAGE: &str =
    "<html><body><p>Login failed. You can return to the wallet.</p></body></html>";

type CallbackResult = Result<Identity, String>;

/// Query string of the provider's redirect.
#[derive(Debug, Default, Deserialize)]
struct CallbackParams {
    principal: Option<String>,
    delegation: Option<String>,
    expiration: Option<String>,
    error: Option<String>,
}

impl CallbackParams {
    fn into_identity(self) -> CallbackResult {
        if let Some(error) = self.error {
            return Err(error);
        }
        match (self.principal, self.delegation, self.expiration) {
            (Some(principal), Some(delegation), Some(expiration)) => expiration
                .parse::<u64>()
                .map(|expires_at_ns| Identity {
                    principal,
                    delegation,
                    expires_at_ns,
                })
                .map_err(|_| format!("invalid expiration: {expiration}")),
            _ => Err("incomplete response from identity provider".to_string()),
        }
    }
}

/// Slot for the first callback result. Later callbacks find it empty.
#[derive(Clone)]
struct CallbackState {
    result_tx: Arc<Mutex<Option<oneshot::Sender<CallbackResult>>>>,
}

async fn callback(
    State(state): State<CallbackState>,
    Query(params): Query<CallbackParams>,
) -> Html<&'static str> {
    let result = params.into_identity();
    let page = match &result {
        Ok(_) => LOGIN_COMPLETE_PAGE,
        Err(_) => LOGIN_FAILED_PAGE,
    };

    let result_tx = state
        .result_tx
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
    match result_tx {
        Some(tx) => {
            if tx.send(result).is_err() {
                debug!("Login callback arrived after the wallet stopped waiting");
            }
        }
        None => debug!("Ignoring repeated login callback"),
    }
    Html(page)
}

/// Stops the callback server once nobody waits for it, timeouts included.
struct ShutdownOnDrop(Arc<Notify>);

impl Drop for ShutdownOnDrop {
    fn drop(&mut self) {
        self.0.notify_one();
    }
}

/// Serve `/callback` until the first redirect arrives.
///
/// Connections are served concurrently, so a browser preconnect that never
/// sends a request does not hold up the real redirect.
async fn wait_for_callback(listener: TcpListener) -> CallbackResult {
    let (result_tx, result_rx) = oneshot::channel();
    let state = CallbackState {
        result_tx: Arc::new(Mutex::new(Some(result_tx))),
    };
    let router = Router::new()
        .route(CALLBACK_PATH, get(callback))
        .with_state(state);

    let shutdown = Arc::new(Notify::new());
    let _shutdown = ShutdownOnDrop(shutdown.clone());
    let server = axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.notified().await });
    tokio::spawn(async move {
        if let Err(e) = server.await {
            warn!("Login callback server failed: {}", e);
        }
    });

    result_rx
        .await
        .map_err(|_| "login callback server stopped".to_string())?
}
