use ii_kaspa_wallet::domain::{status::StatusId, wallet::TransferEdit};
use serde::{Deserialize, Serialize};
use strum::Display;

/// Actions that can be triggered by user input or internal events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    Tick,
    Render,
    Resize(u16, u16),
    Suspend,
    Quit,

    // Tab switching
    TabReceive,
    TabSend,

    // Session
    Login,
    Logout,

    // Wallet
    RefreshBalance,
    CopyAddress,
    OpenExplorer,

    // Transfer
    EditTransfer(TransferEdit),
    PreviewFee,
    SendTransaction,

    // Timers
    StatusExpired(StatusId),
}
