use clap::{Parser, Subcommand};
use ii_kaspa_wallet::config::ConfigOverrides;

#[derive(Parser, Debug)]
#[command(name = "ii-kaspa-wallet")]
#[command(version)]
#[command(about = "A TUI wallet for Kaspa, signed in with Internet Identity")]
pub struct Args {
    /// Tick rate in ticks per second
    #[arg(short, long, default_value_t = 4.0)]
    pub tick_rate: f64,

    /// Frame rate in frames per second
    #[arg(short, long, default_value_t = 60.0)]
    pub frame_rate: f64,

    /// Network to use (`ic` for mainnet, anything else is a local replica)
    /// If not specified, uses DFX_NETWORK or guesses from --host
    #[arg(short, long)]
    pub network: Option<String>,

    /// Replica or boundary node URL (overrides network default)
    #[arg(long)]
    pub host: Option<String>,

    /// Wallet backend canister id
    #[arg(long)]
    pub canister_id: Option<String>,

    /// Internet Identity canister id (local networks only)
    #[arg(long)]
    pub identity_canister_id: Option<String>,

    /// Data directory path
    #[arg(long)]
    pub data_dir: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Show the saved session, wallet address and balance
    Status,

    /// Broadcast a transaction that was built earlier
    Broadcast {
        /// Serialized transaction as returned by the canister
        serialized_tx: String,
    },
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            network: self.network.clone(),
            host: self.host.clone(),
            canister_id: self.canister_id.clone(),
            identity_canister_id: self.identity_canister_id.clone(),
        }
    }
}
