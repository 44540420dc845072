//! Session orchestration: login, wallet bootstrap, transfers, logout.
//!
//! Everything here runs inside spawned tasks and reports back only through
//! the [`EventSink`].

pub mod transfer;
pub mod wallet;

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    domain::{
        error::WalletError,
        session::{Epoch, SessionEvent},
        status::StatusKind,
        wallet::{BuiltTransaction, PendingTransfer, TransactionReceipt},
    },
    infra::{
        desktop::{ClipboardMechanism, copy_with_fallback},
        identity::{Identity, IdentityManager, IdentityProvider, LoginOutcome},
        ledger::RemoteHandle,
        session_factory::{Connector, SessionFactory},
    },
};

use self::{transfer::TransactionWorkflow, wallet::WalletController};

/// Sending half of the session event channel.
#[derive(Clone)]
pub struct EventSink {
    tx: UnboundedSender<SessionEvent>,
}

impl EventSink {
    pub fn new(tx: UnboundedSender<SessionEvent>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn emit(&self, event: SessionEvent) {
        if self.tx.send(event).is_err() {
            debug!("Session event dropped: receiver closed");
        }
    }

    pub fn notify(&self, text: impl Into<String>, kind: StatusKind) {
        self.emit(SessionEvent::Notice {
            text: text.into(),
            kind,
        });
    }

    pub fn report(&self, err: &WalletError) {
        warn!("{}", err);
        self.notify(err.to_string(), StatusKind::Error);
    }
}

/// Clears the busy flag when dropped, whichever way the operation ended.
pub struct BusyGuard {
    events: EventSink,
}

impl BusyGuard {
    pub fn new(events: EventSink) -> Self {
        Self { events }
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.events.emit(SessionEvent::Idle);
    }
}

/// Identity, handle creation, wallet and transfers behind one facade.
pub struct WalletClient<P, C> {
    config: Config,
    identity: IdentityManager<P>,
    factory: SessionFactory<C>,
    wallet: WalletController,
    transfers: TransactionWorkflow,
    events: EventSink,
    epoch: AtomicU64,
    copy_token: AtomicU64,
}

impl<P: IdentityProvider, C: Connector> WalletClient<P, C> {
    pub fn new(
        config: Config,
        identity: IdentityManager<P>,
        factory: SessionFactory<C>,
        events: EventSink,
    ) -> Self {
        let wallet = WalletController::new(events.clone());
        let transfers =
            TransactionWorkflow::new(events.clone(), wallet.clone(), config.refresh_delay);
        Self {
            config,
            identity,
            factory,
            wallet,
            transfers,
            events,
            epoch: AtomicU64::new(0),
            copy_token: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn events(&self) -> &EventSink {
        &self.events
    }

    fn next_epoch(&self) -> Epoch {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Restore a previous session at startup. Returns whether one was found.
    pub async fn start(&self) -> bool {
        let restored = match self.identity.initialize() {
            Ok(true) => self.identity.identity(),
            Ok(false) => None,
            Err(e) => {
                self.events.report(&e);
                None
            }
        };

        match restored {
            Some(identity) => {
                let epoch = self.next_epoch();
                self.events.emit(SessionEvent::SignedIn { epoch });
                self.connect(&identity, epoch).await;
                true
            }
            None => {
                self.events.emit(SessionEvent::Restored);
                false
            }
        }
    }

    /// Interactive login followed by handle creation and wallet bootstrap.
    pub async fn login(&self) -> bool {
        self.events.emit(SessionEvent::AuthStarted);
        self.events
            .notify("Connecting to Internet Identity...", StatusKind::Info);

        let outcome = self
            .identity
            .login(
                &self.config.endpoint.identity_provider,
                self.config.identity_max_ttl,
            )
            .await;

        match outcome {
            LoginOutcome::Authenticated(identity) => {
                let epoch = self.next_epoch();
                self.events.emit(SessionEvent::SignedIn { epoch });
                self.events
                    .notify("Successfully logged in!", StatusKind::Success);
                self.connect(&identity, epoch).await;
                true
            }
            LoginOutcome::Failed(reason) => {
                self.events.emit(SessionEvent::AuthFailed);
                self.events.report(&WalletError::Auth(reason));
                false
            }
        }
    }

    async fn connect(&self, identity: &Identity, epoch: Epoch) -> Option<RemoteHandle> {
        let handle = match self
            .factory
            .create_handle(identity, &self.config.endpoint)
            .await
        {
            Ok(handle) => handle,
            Err(e) => {
                self.events.report(&e);
                return None;
            }
        };

        self.events.emit(SessionEvent::HandleReady {
            epoch,
            handle: handle.clone(),
        });
        // Failures are reported by the controller; the session stays signed in.
        let _ = self.wallet.bootstrap(&handle, epoch).await;
        self.service_info(&handle, epoch).await;
        Some(handle)
    }

    /// Caller principal and canister health, as the canister reports them.
    pub async fn service_info(
        &self,
        handle: &RemoteHandle,
        epoch: Epoch,
    ) -> Option<(String, String)> {
        let (whoami, health) = tokio::join!(handle.whoami(), handle.health());
        match (whoami, health) {
            (Ok(whoami), Ok(health)) => {
                self.events.emit(SessionEvent::ServiceInfo {
                    epoch,
                    whoami: whoami.clone(),
                    health: health.clone(),
                });
                Some((whoami, health))
            }
            (whoami, health) => {
                warn!(
                    "Service info unavailable: whoami={:?} health={:?}",
                    whoami.err(),
                    health.err()
                );
                None
            }
        }
    }

    /// Forget the identity. Always ends signed out.
    pub async fn logout(&self) {
        let epoch = self.next_epoch();
        let result = self.identity.logout().await;
        self.events.emit(SessionEvent::SignedOut { epoch });
        match result {
            Ok(()) => self
                .events
                .notify("Logged out successfully", StatusKind::Info),
            Err(e) => self.events.report(&e),
        }
        info!("Signed out");
    }

    pub async fn refresh(
        &self,
        handle: Option<&RemoteHandle>,
        address: Option<&str>,
        epoch: Epoch,
    ) -> Result<(), WalletError> {
        self.wallet
            .refresh_balance(handle, address, epoch)
            .await
            .map(|_| ())
    }

    pub async fn send(
        &self,
        handle: Option<&RemoteHandle>,
        from: Option<&str>,
        transfer: &PendingTransfer,
        epoch: Epoch,
    ) -> Result<TransactionReceipt, WalletError> {
        self.transfers.send(handle, from, transfer, epoch).await
    }

    pub async fn preview(
        &self,
        handle: Option<&RemoteHandle>,
        from: Option<&str>,
        transfer: &PendingTransfer,
        epoch: Epoch,
    ) -> Result<BuiltTransaction, WalletError> {
        self.transfers.preview(handle, from, transfer, epoch).await
    }

    pub async fn broadcast(
        &self,
        handle: &RemoteHandle,
        serialized_tx: &str,
    ) -> Result<String, WalletError> {
        self.transfers.broadcast(handle, serialized_tx).await
    }

    /// Copy the wallet address and show the copied indicator for a while.
    ///
    /// Each copy gets a fresh token, so an older timer never clears the
    /// indicator of a newer copy.
    pub fn copy_address(
        &self,
        address: &str,
        primary: &dyn ClipboardMechanism,
        fallback: &dyn ClipboardMechanism,
    ) -> Result<(), WalletError> {
        if let Err(e) = copy_with_fallback(primary, fallback, address) {
            self.events.report(&e);
            return Err(e);
        }

        let token = self.copy_token.fetch_add(1, Ordering::SeqCst) + 1;
        self.events.emit(SessionEvent::Copied { token });
        self.events
            .notify("Address copied to clipboard!", StatusKind::Success);

        let events = self.events.clone();
        let ttl = self.config.copied_ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            events.emit(SessionEvent::CopyExpired { token });
        });
        Ok(())
    }

    /// Handle for the persisted identity, for one-shot commands.
    pub async fn open_restored(&self) -> Result<RemoteHandle, WalletError> {
        if !self.identity.initialize()? {
            return Err(WalletError::Auth(
                "no saved session; log in from the wallet first".to_string(),
            ));
        }
        let identity = self
            .identity
            .identity()
            .ok_or_else(|| WalletError::Auth("no saved session".to_string()))?;
        self.factory
            .create_handle(&identity, &self.config.endpoint)
            .await
    }
}
