//! One-shot commands that reuse the saved session without the terminal UI.

use color_eyre::eyre::Result;
use ii_kaspa_wallet::{
    config::Config,
    domain::{
        amount::{format_balance, format_kas},
        error::WalletError,
    },
};

use crate::{app::build_client, errors};

fn print_success(message: &str) {
    println!("\x1b[32m{}\x1b[0m", message);
}

/// Print the session, address and balance.
pub async fn status(config: Config) -> Result<()> {
    let (client, _events) = build_client(config)?;
    let handle = errors::session_hint(client.open_restored().await)?;

    println!("Network:    {}", handle.network());
    println!("Principal:  {}", handle.principal());
    if let Some((whoami, health)) = client.service_info(&handle, 0).await {
        println!("Canister:   {} ({})", whoami, health);
    }

    let address = handle
        .generate_address()
        .await
        .map_err(|e| WalletError::WalletSetup(e.to_string()))?;
    let balance = handle
        .get_balance(&address.address)
        .await
        .map_err(|e| WalletError::BalanceRefresh(e.to_string()))?;

    println!("Address:    {}", address.address);
    println!();
    print_success(&format!("Balance: {} KAS", format_balance(balance.total)));
    println!("  Confirmed:   {} KAS", format_kas(balance.confirmed, 8));
    println!("  Unconfirmed: {} KAS", format_kas(balance.unconfirmed, 8));
    println!("  Immature:    {} KAS", format_kas(balance.immature, 8));
    Ok(())
}

/// Broadcast a pre-built transaction and print where to follow it.
pub async fn broadcast(config: Config, serialized_tx: &str) -> Result<()> {
    let (client, _events) = build_client(config)?;
    let handle = errors::session_hint(client.open_restored().await)?;

    let tx_id = client.broadcast(&handle, serialized_tx).await?;

    print_success(&format!("Transaction broadcast: {}", tx_id));
    println!("{}", client.config().explorer_url(&tx_id));
    Ok(())
}
