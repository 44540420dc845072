use color_eyre::Result;
use ii_kaspa_wallet::config::Config;

mod action;
mod app;
mod cli;
mod commands;
mod components;
mod errors;
mod logging;
mod tui;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse_args();

    if let Some(ref data_dir) = args.data_dir {
        // SAFETY: nothing else reads or writes the environment yet
        unsafe {
            std::env::set_var("II_KASPA_WALLET_DATA", data_dir);
        }
    }

    errors::install_hooks(&logging::log_path())?;
    logging::init()?;

    let config = errors::config_hint(Config::resolve(&args.overrides(), |key| {
        std::env::var(key).ok()
    }))?;

    match args.command {
        Some(cli::Command::Status) => commands::status(config).await,
        Some(cli::Command::Broadcast { ref serialized_tx }) => {
            commands::broadcast(config, serialized_tx).await
        }
        None => {
            let mut app = app::App::new(&args, config)?;
            app.run().await
        }
    }
}
