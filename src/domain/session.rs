//! Composite session state and its reducer.
//!
//! Workflows never touch [`SessionState`] directly. They emit
//! [`SessionEvent`]s which the UI loop feeds through [`SessionState::apply`].
//! Every remote result carries the epoch it was started under; results from
//! an earlier epoch are dropped.

use strum::Display;

use super::{
    status::StatusKind,
    wallet::{Address, Balance, BuiltTransaction, PendingTransfer, TransactionReceipt, TransferEdit},
};
use crate::infra::ledger::RemoteHandle;

/// Authentication generation. Bumped on every login and logout.
pub type Epoch = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum WalletPhase {
    Uninitialized,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Phase {
    LoggedOut,
    Authenticating,
    LoggedIn(WalletPhase),
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// No valid identity was restored at startup.
    Restored,
    AuthStarted,
    AuthFailed,
    SignedIn { epoch: Epoch },
    HandleReady { epoch: Epoch, handle: RemoteHandle },
    ServiceInfo { epoch: Epoch, whoami: String, health: String },
    AddressGenerated { epoch: Epoch, address: Address },
    BalanceLoaded { epoch: Epoch, balance: Balance },
    TransferSent { epoch: Epoch, receipt: TransactionReceipt },
    FeePreviewed { epoch: Epoch, built: BuiltTransaction },
    SignedOut { epoch: Epoch },
    TransferEdited(TransferEdit),
    Copied { token: u64 },
    CopyExpired { token: u64 },
    /// The in-flight operation finished, however it ended.
    Idle,
    Notice { text: String, kind: StatusKind },
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub phase: Phase,
    pub epoch: Epoch,
    pub handle: Option<RemoteHandle>,
    pub whoami: Option<String>,
    pub health: Option<String>,
    pub address: Option<Address>,
    pub balance: Option<Balance>,
    pub pending: PendingTransfer,
    pub last_receipt: Option<TransactionReceipt>,
    pub fee_preview: Option<BuiltTransaction>,
    copied: Option<u64>,
    busy: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            phase: Phase::LoggedOut,
            epoch: 0,
            handle: None,
            whoami: None,
            health: None,
            address: None,
            balance: None,
            pending: PendingTransfer::default(),
            last_receipt: None,
            fee_preview: None,
            copied: None,
            busy: false,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.phase, Phase::LoggedIn(_))
    }

    pub fn is_wallet_ready(&self) -> bool {
        self.phase == Phase::LoggedIn(WalletPhase::Ready)
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn is_copied(&self) -> bool {
        self.copied.is_some()
    }

    /// Mark an operation as in flight. Returns `false` if one already is.
    pub fn try_begin(&mut self) -> bool {
        if self.busy {
            return false;
        }
        self.busy = true;
        true
    }

    /// Whether a result started under `epoch` may still be applied.
    pub fn is_current(&self, epoch: Epoch) -> bool {
        self.is_authenticated() && self.epoch == epoch
    }

    /// Apply one event. Returns `false` if it was stale or not applicable.
    pub fn apply(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::Restored | SessionEvent::AuthFailed => {
                if self.is_authenticated() {
                    return false;
                }
                self.phase = Phase::LoggedOut;
                true
            }
            SessionEvent::AuthStarted => {
                if self.phase != Phase::LoggedOut {
                    return false;
                }
                self.phase = Phase::Authenticating;
                true
            }
            SessionEvent::SignedIn { epoch } => {
                if epoch <= self.epoch {
                    return false;
                }
                self.clear_wallet();
                self.epoch = epoch;
                self.phase = Phase::LoggedIn(WalletPhase::Uninitialized);
                true
            }
            SessionEvent::HandleReady { epoch, handle } => {
                if !self.is_current(epoch) {
                    return false;
                }
                self.handle = Some(handle);
                true
            }
            SessionEvent::ServiceInfo {
                epoch,
                whoami,
                health,
            } => {
                if !self.is_current(epoch) {
                    return false;
                }
                self.whoami = Some(whoami);
                self.health = Some(health);
                true
            }
            SessionEvent::AddressGenerated { epoch, address } => {
                if !self.is_current(epoch) || self.address.is_some() {
                    return false;
                }
                self.address = Some(address);
                true
            }
            SessionEvent::BalanceLoaded { epoch, balance } => {
                if !self.is_current(epoch) || self.address.is_none() {
                    return false;
                }
                self.balance = Some(balance);
                self.phase = Phase::LoggedIn(WalletPhase::Ready);
                true
            }
            SessionEvent::TransferSent { epoch, receipt } => {
                if !self.is_current(epoch) {
                    return false;
                }
                self.last_receipt = Some(receipt);
                self.fee_preview = None;
                self.pending.clear();
                true
            }
            SessionEvent::FeePreviewed { epoch, built } => {
                if !self.is_current(epoch) {
                    return false;
                }
                self.fee_preview = Some(built);
                true
            }
            SessionEvent::SignedOut { epoch } => {
                if epoch <= self.epoch {
                    return false;
                }
                self.clear_wallet();
                self.epoch = epoch;
                self.phase = Phase::LoggedOut;
                true
            }
            SessionEvent::TransferEdited(edit) => {
                if !self.is_authenticated() {
                    return false;
                }
                self.pending.apply(edit);
                self.fee_preview = None;
                true
            }
            SessionEvent::Copied { token } => {
                if self.address.is_none() {
                    return false;
                }
                self.copied = Some(token);
                true
            }
            SessionEvent::CopyExpired { token } => {
                if self.copied != Some(token) {
                    return false;
                }
                self.copied = None;
                true
            }
            SessionEvent::Idle => {
                self.busy = false;
                true
            }
            // Routed to the status notifier by the caller.
            SessionEvent::Notice { .. } => true,
        }
    }

    fn clear_wallet(&mut self) {
        self.handle = None;
        self.whoami = None;
        self.health = None;
        self.address = None;
        self.balance = None;
        self.pending.clear();
        self.last_receipt = None;
        self.fee_preview = None;
        self.copied = None;
    }
}
