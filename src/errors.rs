//! Panic and error reporting for the terminal client.

use std::{panic, path::Path};

use color_eyre::{Section, config::HookBuilder, eyre::Result};

use crate::{logging::log_panic, tui};

/// Install panic and error hooks. Panic reports point at the session log.
pub fn install_hooks(log_path: &Path) -> Result<()> {
    let (panic_hook, eyre_hook) = HookBuilder::default()
        .panic_section(format!(
            "The wallet crashed. The session log is at {}.\n\
             Please attach it when reporting at {}/issues",
            log_path.display(),
            env!("CARGO_PKG_REPOSITORY")
        ))
        .capture_span_trace_by_default(false)
        .display_location_section(true)
        .display_env_section(false)
        .into_hooks();

    let panic_hook = panic_hook.into_panic_hook();
    panic::set_hook(Box::new(move |panic_info| {
        log_panic(panic_info);
        // Leave raw mode and the alternate screen before printing.
        if let Err(e) = tui::restore() {
            eprintln!("Failed to restore terminal: {e}");
        }
        panic_hook(panic_info);
    }));

    eyre_hook.install()?;
    Ok(())
}

/// Point at the flags and variables that resolve the canister endpoint.
pub fn config_hint<T>(result: Result<T>) -> Result<T> {
    result
        .suggestion("Pass --canister-id, or set CANISTER_ID_BACKEND when running under dfx")
        .suggestion("Use --network ic for mainnet; local replicas default to 127.0.0.1:4943")
}

/// One-shot commands reuse the session saved by the terminal UI.
pub fn session_hint<T, E>(result: std::result::Result<T, E>) -> Result<T>
where
    E: Into<color_eyre::Report>,
{
    result.suggestion("Run ii-kaspa-wallet without a subcommand and log in first")
}
