//! Best-effort desktop integration: clipboard and opening links.

use std::{
    io::{self, Write},
    process::{Command, Stdio},
};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use color_eyre::eyre::{Result, eyre};
use tracing::warn;

use crate::domain::error::WalletError;

/// One way of putting text on the clipboard.
pub trait ClipboardMechanism {
    fn name(&self) -> &'static str;
    fn copy(&self, text: &str) -> Result<()>;
}

/// Pipe the text into the platform clipboard command.
pub struct SystemClipboard;

impl SystemClipboard {
    fn command() -> (&'static str, &'static [&'static str]) {
        if cfg!(target_os = "macos") {
            ("pbcopy", &[])
        } else if cfg!(windows) {
            ("clip", &[])
        } else if std::env::var_os("WAYLAND_DISPLAY").is_some() {
            ("wl-copy", &[])
        } else {
            ("xclip", &["-selection", "clipboard"])
        }
    }
}

impl ClipboardMechanism for SystemClipboard {
    fn name(&self) -> &'static str {
        Self::command().0
    }

    fn copy(&self, text: &str) -> Result<()> {
        let (program, args) = Self::command();
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        child
            .stdin
            .take()
            .ok_or_else(|| eyre!("{} has no stdin", program))?
            .write_all(text.as_bytes())?;
        let status = child.wait()?;
        if !status.success() {
            return Err(eyre!("{} exited with {}", program, status));
        }
        Ok(())
    }
}

/// Ask the terminal to set the clipboard with an OSC 52 escape.
pub struct Osc52Clipboard;

impl ClipboardMechanism for Osc52Clipboard {
    fn name(&self) -> &'static str {
        "osc52"
    }

    fn copy(&self, text: &str) -> Result<()> {
        let mut out = io::stdout();
        write!(out, "\x1b]52;c;{}\x07", STANDARD.encode(text))?;
        out.flush()?;
        Ok(())
    }
}

/// Try `primary`, then `fallback`. Only a failure of both is reported.
pub fn copy_with_fallback(
    primary: &dyn ClipboardMechanism,
    fallback: &dyn ClipboardMechanism,
    text: &str,
) -> Result<(), WalletError> {
    let Err(primary_err) = primary.copy(text) else {
        return Ok(());
    };
    warn!("{} copy failed: {}", primary.name(), primary_err);

    fallback.copy(text).map_err(|e| {
        warn!("{} copy failed: {}", fallback.name(), e);
        WalletError::Clipboard(e.to_string())
    })
}

/// Open a URL in the default browser without waiting for it.
pub fn open_url(url: &str) -> Result<()> {
    let mut command = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else {
        Command::new("xdg-open")
    };
    command
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(())
}
