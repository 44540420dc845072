//! Conversion between KAS decimal strings and integer sompi.

use super::error::WalletError;

/// Sompi per KAS.
pub const SOMPI_PER_KAS: u64 = 100_000_000;

/// Fractional digits of one sompi.
pub const KAS_DECIMALS: usize = 8;

/// Convert a KAS amount string to sompi, truncating anything below one sompi.
///
/// Plain decimals are converted exactly. Other float syntax (e.g. `1e-3`) goes
/// through `f64` and is floored. Callers are expected to have run
/// [`validate_amount`] first; this only rejects values that cannot be
/// represented as a `u64` at all.
pub fn to_sompi(amount: &str) -> Result<u64, WalletError> {
    let s = amount.trim();
    if s.is_empty() {
        return Err(WalletError::Validation("Amount is required".to_string()));
    }

    if let Some((int, frac)) = split_plain_decimal(s) {
        let whole: u64 = if int.is_empty() {
            0
        } else {
            int.parse().map_err(|_| amount_too_large())?
        };
        let frac: String = frac.chars().take(KAS_DECIMALS).collect();
        let frac_padded = format!("{:0<width$}", frac, width = KAS_DECIMALS);
        let frac: u64 = frac_padded.parse().map_err(|_| invalid_amount(s))?;
        return whole
            .checked_mul(SOMPI_PER_KAS)
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(amount_too_large);
    }

    let value: f64 = s.parse().map_err(|_| invalid_amount(s))?;
    if !value.is_finite() || value < 0.0 {
        return Err(invalid_amount(s));
    }
    let sompi = (value * SOMPI_PER_KAS as f64).floor();
    if sompi >= u64::MAX as f64 {
        return Err(amount_too_large());
    }
    Ok(sompi as u64)
}

/// Check a user-entered amount before it is submitted.
pub fn validate_amount(amount: &str) -> Result<(), WalletError> {
    let s = amount.trim();
    if s.is_empty() {
        return Err(WalletError::Validation("Amount is required".to_string()));
    }
    let (_, frac) = split_plain_decimal(s).ok_or_else(|| invalid_amount(s))?;
    if frac.len() > KAS_DECIMALS {
        return Err(WalletError::Validation(format!(
            "Amount has more than {} decimal places",
            KAS_DECIMALS
        )));
    }
    match to_sompi(s)? {
        0 => Err(WalletError::Validation(
            "Amount must be greater than 0".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Format sompi as KAS with a fixed number of fractional digits.
///
/// Digits beyond the eighth are zero; fewer than eight are rounded half up.
pub fn format_kas(sompi: u64, decimals: usize) -> String {
    if decimals >= KAS_DECIMALS {
        let whole = sompi / SOMPI_PER_KAS;
        let frac = sompi % SOMPI_PER_KAS;
        return format!(
            "{}.{:08}{}",
            whole,
            frac,
            "0".repeat(decimals - KAS_DECIMALS)
        );
    }

    let scale = 10u128.pow((KAS_DECIMALS - decimals) as u32);
    let rounded = (sompi as u128 + scale / 2) / scale;
    if decimals == 0 {
        return rounded.to_string();
    }
    let unit = 10u128.pow(decimals as u32);
    format!(
        "{}.{:0width$}",
        rounded / unit,
        rounded % unit,
        width = decimals
    )
}

/// Format a balance for display with all eight fractional digits.
pub fn format_balance(sompi: u64) -> String {
    format_kas(sompi, KAS_DECIMALS)
}

/// Shorten a transaction id for display. The stored id is never altered.
pub fn format_tx_id(tx_id: &str) -> String {
    let len = tx_id.chars().count();
    if len <= 16 {
        return tx_id.to_string();
    }
    let head: String = tx_id.chars().take(8).collect();
    let tail: String = tx_id.chars().skip(len - 8).collect();
    format!("{}...{}", head, tail)
}

/// Split `123.456`, `123`, `.5` or `5.` into its integer and fraction digits.
fn split_plain_decimal(s: &str) -> Option<(&str, &str)> {
    let (int, frac) = match s.split_once('.') {
        Some((int, frac)) => (int, frac),
        None => (s, ""),
    };
    let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    if (int.is_empty() && frac.is_empty()) || !all_digits(int) || !all_digits(frac) {
        return None;
    }
    Some((int, frac))
}

fn invalid_amount(s: &str) -> WalletError {
    WalletError::Validation(format!("Invalid amount: {}", s))
}

fn amount_too_large() -> WalletError {
    WalletError::Validation("Amount is too large".to_string())
}
