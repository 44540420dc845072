//! Integration tests for ii-kaspa-wallet.
//!
//! Drives the session workflows end to end against in-memory doubles:
//! - `MockLedger` scripts the canister and counts calls
//! - `MockProvider` stands in for Internet Identity
//! - `MockConnector` hands out the ledger and records trust bootstrap
//!
//! Events are applied to a `SessionState` and a `StatusNotifier` the same
//! way the terminal UI does it.

pub mod e2e_login_flow;
pub mod e2e_send_flow;
pub mod mocks;

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use ii_kaspa_wallet::{
    config::{Config, ConfigOverrides},
    domain::{
        error::WalletError,
        session::{SessionEvent, SessionState},
        status::{StatusKind, StatusNotifier},
        wallet::{
            BuiltTransaction, PendingTransfer, TransactionReceipt, TransferEdit, TransferField,
        },
    },
    infra::{
        identity::{Identity, IdentityManager},
        session_factory::SessionFactory,
        store::Store,
    },
    workflow::{EventSink, WalletClient},
};
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

use mocks::{MockConnector, MockLedger, MockProvider};

pub const CANISTER_ID: &str = "uxrrr-q7777-77774-qaaaq-cai";

pub type TestClient = WalletClient<MockProvider, MockConnector>;

/// Test environment for one client with its own store.
pub struct TestEnv {
    pub client: Arc<TestClient>,
    pub ledger: Arc<MockLedger>,
    pub store: Store,
    pub session: SessionState,
    pub status: StatusNotifier,
    /// Every status message published, in order.
    pub notices: Vec<(String, StatusKind)>,
    pub root_key_fetches: Arc<AtomicUsize>,
    pub authenticate_calls: Arc<AtomicUsize>,
    pub revoke_calls: Arc<AtomicUsize>,
    events: UnboundedReceiver<SessionEvent>,
    _dir: TempDir,
}

pub struct TestEnvBuilder {
    network: Option<String>,
    ledger: MockLedger,
    provider: MockProvider,
    fail_trust_bootstrap: bool,
    stored_identity: Option<Identity>,
}

impl TestEnvBuilder {
    pub fn network(mut self, network: &str) -> Self {
        self.network = Some(network.to_string());
        self
    }

    pub fn ledger(mut self, ledger: MockLedger) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn provider(mut self, provider: MockProvider) -> Self {
        self.provider = provider;
        self
    }

    pub fn fail_trust_bootstrap(mut self) -> Self {
        self.fail_trust_bootstrap = true;
        self
    }

    pub fn stored_identity(mut self, identity: Identity) -> Self {
        self.stored_identity = Some(identity);
        self
    }

    pub fn build(self) -> TestEnv {
        let dir = TempDir::new().expect("temp dir");
        let store = Store::with_path(dir.path().join("wallet.mdb")).expect("open store");
        if let Some(identity) = &self.stored_identity {
            store.save_identity(identity).expect("save identity");
        }

        let overrides = ConfigOverrides {
            network: self.network,
            canister_id: Some(CANISTER_ID.to_string()),
            ..Default::default()
        };
        let config = Config::resolve(&overrides, |_| None).expect("resolve config");

        let ledger = Arc::new(self.ledger);
        let mut connector = MockConnector::new(ledger.clone());
        connector.fail_fetch = self.fail_trust_bootstrap;
        let root_key_fetches = connector.root_key_fetches.clone();
        let authenticate_calls = self.provider.authenticate_calls.clone();
        let revoke_calls = self.provider.revoke_calls.clone();

        let (events, event_rx) = EventSink::channel();
        let client = WalletClient::new(
            config,
            IdentityManager::new(self.provider, store.clone()),
            SessionFactory::new(connector),
            events,
        );

        TestEnv {
            client: Arc::new(client),
            ledger,
            store,
            session: SessionState::new(),
            status: StatusNotifier::default(),
            notices: Vec::new(),
            root_key_fetches,
            authenticate_calls,
            revoke_calls,
            events: event_rx,
            _dir: dir,
        }
    }
}

impl TestEnv {
    pub fn builder() -> TestEnvBuilder {
        TestEnvBuilder {
            network: None,
            ledger: MockLedger::default(),
            provider: MockProvider::succeeding(),
            fail_trust_bootstrap: false,
            stored_identity: None,
        }
    }

    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Apply every event emitted so far.
    pub fn drain(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                SessionEvent::Notice { text, kind } => {
                    self.status.publish(text.clone(), kind);
                    self.notices.push((text, kind));
                }
                event => {
                    self.session.apply(event);
                }
            }
        }
    }

    pub fn status_text(&self) -> Option<&str> {
        self.status.current().map(|m| m.text.as_str())
    }

    pub fn status_kind(&self) -> Option<StatusKind> {
        self.status.current().map(|m| m.kind)
    }

    pub fn saw_notice(&self, text: &str) -> bool {
        self.notices.iter().any(|(t, _)| t == text)
    }

    pub fn root_key_fetch_count(&self) -> usize {
        self.root_key_fetches.load(Ordering::SeqCst)
    }

    pub async fn start(&mut self) -> bool {
        let restored = self.client.start().await;
        self.drain();
        restored
    }

    pub async fn login(&mut self) -> bool {
        let ok = self.client.login().await;
        self.drain();
        ok
    }

    pub async fn logout(&mut self) {
        self.client.logout().await;
        self.drain();
    }

    pub async fn refresh(&mut self) -> Result<(), WalletError> {
        let handle = self.session.handle.clone();
        let address = self.wallet_address();
        let result = self
            .client
            .refresh(handle.as_ref(), address.as_deref(), self.session.epoch)
            .await;
        self.drain();
        result
    }

    pub async fn send(
        &mut self,
        transfer: &PendingTransfer,
    ) -> Result<TransactionReceipt, WalletError> {
        let handle = self.session.handle.clone();
        let from = self.wallet_address();
        let result = self
            .client
            .send(handle.as_ref(), from.as_deref(), transfer, self.session.epoch)
            .await;
        self.drain();
        result
    }

    pub async fn preview(
        &mut self,
        transfer: &PendingTransfer,
    ) -> Result<BuiltTransaction, WalletError> {
        let handle = self.session.handle.clone();
        let from = self.wallet_address();
        let result = self
            .client
            .preview(handle.as_ref(), from.as_deref(), transfer, self.session.epoch)
            .await;
        self.drain();
        result
    }

    /// Fill the send form through reducer edits, like typing would.
    pub fn fill_transfer(&mut self, to: &str, amount: &str) {
        for edit in [
            TransferEdit::Clear,
            TransferEdit::Paste(TransferField::ToAddress, to.to_string()),
            TransferEdit::Paste(TransferField::Amount, amount.to_string()),
        ] {
            self.session.apply(SessionEvent::TransferEdited(edit));
        }
    }

    pub fn wallet_address(&self) -> Option<String> {
        self.session.address.as_ref().map(|a| a.address.clone())
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
