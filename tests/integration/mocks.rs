//! In-memory stand-ins for the canister, the identity provider and the transport.

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use color_eyre::eyre::{self, eyre};
use ii_kaspa_wallet::{
    config::EndpointConfig,
    domain::{
        error::RemoteError,
        wallet::{Address, Balance, BuiltTransaction, TransactionReceipt},
    },
    infra::{
        desktop::ClipboardMechanism,
        identity::{Identity, IdentityProvider},
        ledger::LedgerService,
        session_factory::Connector,
    },
};
use tokio::sync::Notify;

pub const WALLET_ADDRESS: &str =
    "kaspa:qpauqsvk7yf9unexwmxsnmg547mhyga37csh0kj53q6xxgl24ydxjsgzthw5j";
pub const RECIPIENT: &str =
    "kaspa:qr0lr4ml9fn3chekrqmjdkergxl93l4wrk3dankcgvjq776s9wn9jkdskewva";
pub const PRINCIPAL: &str = "rrkah-fqaaa-aaaaa-aaaaq-cai";

pub fn address() -> Address {
    Address {
        addr_type: 0,
        address: WALLET_ADDRESS.to_string(),
        derivation_path: "m/44'/111111'/0'/0/0".to_string(),
        public_key: vec![0x02; 33],
        script_public_key: "20aabb".to_string(),
    }
}

pub fn balance(total: u64) -> Balance {
    Balance {
        confirmed: total,
        unconfirmed: 0,
        immature: 0,
        total,
    }
}

pub fn identity(expires_at_ns: u64) -> Identity {
    Identity {
        principal: PRINCIPAL.to_string(),
        delegation: "delegation-chain".to_string(),
        expires_at_ns,
    }
}

/// Scripted ledger canister. Every method counts its calls.
pub struct MockLedger {
    pub address: Mutex<Result<Address, String>>,
    pub balance: Mutex<Result<Balance, String>>,
    pub send: Mutex<Result<TransactionReceipt, String>>,
    pub build: Mutex<Result<BuiltTransaction, String>>,
    /// When set, `get_balance` waits for a permit before answering.
    pub balance_gate: Mutex<Option<Arc<Notify>>>,
    pub generate_address_calls: AtomicUsize,
    pub get_balance_calls: AtomicUsize,
    pub build_calls: AtomicUsize,
    pub sent: Mutex<Vec<(String, String, u64)>>,
    pub broadcasts: Mutex<Vec<String>>,
}

impl Default for MockLedger {
    fn default() -> Self {
        Self {
            address: Mutex::new(Ok(address())),
            balance: Mutex::new(Ok(balance(250_000_000))),
            send: Mutex::new(Ok(TransactionReceipt {
                transaction_id: "4b1d2c3e5f60718293a4b5c6d7e8f90112233445566778899aabbccddeeff00"
                    .to_string(),
                fee_paid: 2_036,
            })),
            build: Mutex::new(Ok(BuiltTransaction {
                serialized_tx: "0100deadbeef".to_string(),
                fee_paid: 2_036,
            })),
            balance_gate: Mutex::new(None),
            generate_address_calls: AtomicUsize::new(0),
            get_balance_calls: AtomicUsize::new(0),
            build_calls: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
            broadcasts: Mutex::new(Vec::new()),
        }
    }
}

impl MockLedger {
    pub fn failing_balance(reason: &str) -> Self {
        Self {
            balance: Mutex::new(Err(reason.to_string())),
            ..Default::default()
        }
    }

    pub fn failing_address(reason: &str) -> Self {
        Self {
            address: Mutex::new(Err(reason.to_string())),
            ..Default::default()
        }
    }

    pub fn set_balance(&self, total: u64) {
        *self.balance.lock().unwrap() = Ok(balance(total));
    }

    pub fn fail_balance(&self, reason: &str) {
        *self.balance.lock().unwrap() = Err(reason.to_string());
    }

    pub fn set_send(&self, result: Result<TransactionReceipt, String>) {
        *self.send.lock().unwrap() = result;
    }

    pub fn gate_balance(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.balance_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn balance_calls(&self) -> usize {
        self.get_balance_calls.load(Ordering::SeqCst)
    }

    pub fn address_calls(&self) -> usize {
        self.generate_address_calls.load(Ordering::SeqCst)
    }

    pub fn send_calls(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn remote_calls(&self) -> usize {
        self.address_calls()
            + self.balance_calls()
            + self.send_calls()
            + self.build_calls.load(Ordering::SeqCst)
            + self.broadcasts.lock().unwrap().len()
    }
}

fn reply<T: Clone>(slot: &Mutex<Result<T, String>>) -> Result<T, RemoteError> {
    slot.lock()
        .unwrap()
        .clone()
        .map_err(RemoteError::Rejected)
}

#[async_trait]
impl LedgerService for MockLedger {
    async fn generate_address(&self) -> Result<Address, RemoteError> {
        self.generate_address_calls.fetch_add(1, Ordering::SeqCst);
        reply(&self.address)
    }

    async fn get_balance(&self, address: &str) -> Result<Balance, RemoteError> {
        assert_eq!(address, WALLET_ADDRESS);
        self.get_balance_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.balance_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        reply(&self.balance)
    }

    async fn send_transaction(
        &self,
        from: &str,
        to: &str,
        amount: u64,
    ) -> Result<TransactionReceipt, RemoteError> {
        self.sent
            .lock()
            .unwrap()
            .push((from.to_string(), to.to_string(), amount));
        reply(&self.send)
    }

    async fn build_transaction(
        &self,
        _from: &str,
        _to: &str,
        _amount: u64,
    ) -> Result<BuiltTransaction, RemoteError> {
        self.build_calls.fetch_add(1, Ordering::SeqCst);
        reply(&self.build)
    }

    async fn broadcast_transaction(&self, serialized_tx: &str) -> Result<String, RemoteError> {
        self.broadcasts
            .lock()
            .unwrap()
            .push(serialized_tx.to_string());
        Ok("b7e1f00d".to_string())
    }

    async fn whoami(&self) -> Result<String, RemoteError> {
        Ok(PRINCIPAL.to_string())
    }

    async fn health(&self) -> Result<String, RemoteError> {
        Ok("ok".to_string())
    }
}

/// Identity provider that answers immediately.
pub struct MockProvider {
    pub outcome: Result<Identity, String>,
    pub revoke_error: Option<String>,
    pub authenticate_calls: Arc<AtomicUsize>,
    pub revoke_calls: Arc<AtomicUsize>,
}

impl MockProvider {
    pub fn succeeding() -> Self {
        Self {
            outcome: Ok(identity(u64::MAX)),
            revoke_error: None,
            authenticate_calls: Arc::default(),
            revoke_calls: Arc::default(),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            outcome: Err(reason.to_string()),
            ..Self::succeeding()
        }
    }

    pub fn failing_revoke(reason: &str) -> Self {
        Self {
            revoke_error: Some(reason.to_string()),
            ..Self::succeeding()
        }
    }
}

#[async_trait]
impl IdentityProvider for MockProvider {
    async fn authenticate(
        &self,
        _provider_url: &str,
        _max_ttl: Duration,
    ) -> Result<Identity, String> {
        self.authenticate_calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }

    async fn revoke(&self, _identity: &Identity) -> Result<(), String> {
        self.revoke_calls.fetch_add(1, Ordering::SeqCst);
        match &self.revoke_error {
            Some(reason) => Err(reason.clone()),
            None => Ok(()),
        }
    }
}

/// Connector handing out the shared [`MockLedger`].
pub struct MockConnector {
    pub ledger: Arc<MockLedger>,
    pub fail_fetch: bool,
    pub root_key_fetches: Arc<AtomicUsize>,
    pub connects: Arc<AtomicUsize>,
}

impl MockConnector {
    pub fn new(ledger: Arc<MockLedger>) -> Self {
        Self {
            ledger,
            fail_fetch: false,
            root_key_fetches: Arc::default(),
            connects: Arc::default(),
        }
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn fetch_root_key(&self, _endpoint: &EndpointConfig) -> Result<Vec<u8>, RemoteError> {
        self.root_key_fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch {
            Err(RemoteError::Transport("connection refused".to_string()))
        } else {
            Ok(vec![0x30, 0x81, 0x82])
        }
    }

    fn connect(
        &self,
        _identity: &Identity,
        _endpoint: &EndpointConfig,
        _root_key: Option<&[u8]>,
    ) -> Result<Arc<dyn LedgerService>, RemoteError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.ledger.clone())
    }
}

/// Clipboard that records what it was given, or refuses everything.
#[derive(Default)]
pub struct MockClipboard {
    pub fails: bool,
    pub copied: Mutex<Vec<String>>,
}

impl MockClipboard {
    pub fn failing() -> Self {
        Self {
            fails: true,
            ..Default::default()
        }
    }
}

impl ClipboardMechanism for MockClipboard {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn copy(&self, text: &str) -> eyre::Result<()> {
        if self.fails {
            return Err(eyre!("no clipboard available"));
        }
        self.copied.lock().unwrap().push(text.to_string());
        Ok(())
    }
}
