use std::path::PathBuf;

use color_eyre::eyre::Result;
use ii_kaspa_wallet::config::get_data_dir;
use tracing::{error, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::{self, EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE: &str = "ii-kaspa-wallet.log";

pub fn log_path() -> PathBuf {
    get_data_dir().join(LOG_FILE)
}

/// Log to a file in the data directory; the terminal belongs to the UI.
pub fn init() -> Result<()> {
    std::fs::create_dir_all(get_data_dir())?;
    let log_path = log_path();

    let log_file = std::fs::File::create(&log_path)?;

    let file_subscriber = tracing_subscriber::fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_filter(EnvFilter::from_default_env().add_directive("ii_kaspa_wallet=debug".parse()?));

    tracing_subscriber::registry()
        .with(file_subscriber)
        .with(ErrorLayer::default())
        .init();

    info!("Logging to {}", log_path.display());
    Ok(())
}

/// Log a panic message and its location.
pub fn log_panic(panic: &std::panic::PanicHookInfo) {
    let msg = match panic.payload().downcast_ref::<&'static str>() {
        Some(s) => *s,
        None => match panic.payload().downcast_ref::<String>() {
            Some(s) => s.as_str(),
            None => "unknown panic payload",
        },
    };

    let location = panic.location().map_or_else(
        || "unknown location".to_string(),
        |loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()),
    );

    error!("Panic occurred: {} at {}", msg, location);
}
