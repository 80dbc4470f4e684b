use alloy::primitives::U256;
use itertools::Itertools;

/// Fractional digits of both FROLL and VIC.
pub const TOKEN_DECIMALS: u32 = 18;

const ONE_TOKEN: u64 = 1_000_000_000_000_000_000;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum UnitsError {
    #[error("amount is empty")]
    Empty,
    #[error("amount must not carry a sign")]
    Signed,
    #[error("'{0}' is not a decimal number")]
    NotNumeric(String),
    #[error("at most {TOKEN_DECIMALS} fractional digits are supported")]
    TooManyFractionDigits,
    #[error("amount is too large")]
    Overflow,
}

pub fn one_token() -> U256 {
    U256::from(ONE_TOKEN)
}

fn pow10(exp: u32) -> U256 {
    U256::from(10u64).pow(U256::from(exp))
}

/// Parses a decimal token amount ("1", "0.25", ".5", "3.") into base units.
pub fn parse_amount(raw: &str) -> Result<U256, UnitsError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UnitsError::Empty);
    }
    if trimmed.starts_with(['+', '-']) {
        return Err(UnitsError::Signed);
    }
    let (whole, fraction) = match trimmed.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (trimmed, ""),
    };
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction)
    {
        return Err(UnitsError::NotNumeric(trimmed.to_string()));
    }
    if fraction.len() > TOKEN_DECIMALS as usize {
        return Err(UnitsError::TooManyFractionDigits);
    }

    let whole = if whole.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(whole, 10).map_err(|_| UnitsError::Overflow)?
    };
    let padded = format!("{fraction:0<width$}", width = TOKEN_DECIMALS as usize);
    let fraction = U256::from_str_radix(&padded, 10).map_err(|_| UnitsError::Overflow)?;

    whole
        .checked_mul(one_token())
        .and_then(|scaled| scaled.checked_add(fraction))
        .ok_or(UnitsError::Overflow)
}

/// Display rendering: rounds half-up to `max_fraction_digits`, trims trailing
/// zeros and groups the integer part with commas.
pub fn format_amount(value: U256, max_fraction_digits: u32) -> String {
    let digits = max_fraction_digits.min(TOKEN_DECIMALS);
    let unit = pow10(TOKEN_DECIMALS - digits);
    let mut scaled = value / unit;
    let remainder = value % unit;
    if digits < TOKEN_DECIMALS && remainder * U256::from(2u64) >= unit {
        scaled = scaled.saturating_add(U256::from(1u64));
    }

    let divisor = pow10(digits);
    let whole = group_thousands(&(scaled / divisor).to_string());
    if digits == 0 {
        return whole;
    }
    let fraction = format!(
        "{:0>width$}",
        (scaled % divisor).to_string(),
        width = digits as usize
    );
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole
    } else {
        format!("{whole}.{fraction}")
    }
}

/// Full-precision rendering without grouping, parseable by [`parse_amount`].
pub fn format_exact(value: U256) -> String {
    let whole = value / one_token();
    let fraction = value % one_token();
    if fraction.is_zero() {
        return whole.to_string();
    }
    let fraction = format!(
        "{:0>width$}",
        fraction.to_string(),
        width = TOKEN_DECIMALS as usize
    );
    format!("{whole}.{}", fraction.trim_end_matches('0'))
}

fn group_thousands(digits: &str) -> String {
    let bytes = digits.as_bytes();
    let head = bytes.len() % 3;
    let mut groups = Vec::new();
    if head > 0 {
        groups.push(&digits[..head]);
    }
    groups.extend(
        bytes[head..]
            .chunks(3)
            .filter_map(|chunk| std::str::from_utf8(chunk).ok()),
    );
    groups.into_iter().join(",")
}
