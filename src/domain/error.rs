use thiserror::Error;

/// Failures surfaced to the user as transient status messages.
///
/// None of these are fatal; the `Display` text is what the status bar shows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("Init error: {0}")]
    Init(String),
    #[error("Login failed: {0}")]
    Auth(String),
    #[error("Logout error: {0}")]
    Logout(String),
    #[error("Could not reach replica: {0}")]
    TrustBootstrap(String),
    #[error("Error setting up wallet: {0}")]
    WalletSetup(String),
    #[error("Error: {0}")]
    BalanceRefresh(String),
    #[error("{0}")]
    Validation(String),
    #[error("Transaction failed: {0}")]
    Transaction(String),
    #[error("Failed to copy address: {0}")]
    Clipboard(String),
}

/// Failure of a single canister call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The canister answered with its `err` variant.
    #[error("{0}")]
    Rejected(String),
    /// The call never produced a canister answer.
    #[error("{0}")]
    Transport(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        RemoteError::Transport(e.to_string())
    }
}
