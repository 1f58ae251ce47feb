//! Conversion of raw on-chain integer balances into asset units

/// Decimal precision assumed when a token does not declare a usable one.
pub const DEFAULT_DECIMALS: u32 = 18;

/// Largest precision we accept; anything above is treated as undeclared.
const MAX_DECIMALS: u32 = 36;

/// Resolves a declared decimal count. Missing, zero and absurd values fall
/// back to [`DEFAULT_DECIMALS`].
pub fn effective_decimals(declared: Option<u32>) -> u32 {
    match declared {
        Some(d) if d > 0 && d <= MAX_DECIMALS => d,
        _ => DEFAULT_DECIMALS,
    }
}

/// Scales a raw integer balance down by `10^decimals`.
///
/// Always returns a finite, non-negative number.
pub fn normalize_balance(raw: f64, decimals: Option<u32>) -> f64 {
    if !raw.is_finite() || raw <= 0.0 {
        return 0.0;
    }
    let scale = 10f64.powi(effective_decimals(decimals) as i32);
    let normalized = raw / scale;
    if normalized.is_finite() { normalized } else { 0.0 }
}

/// Parses a raw balance that upstream may send as a decimal string, a number
/// in scientific notation, or a `0x` hex quantity.
pub fn parse_raw_amount(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        if hex.is_empty() {
            return Some(0.0);
        }
        return u128::from_str_radix(hex, 16).ok().map(|v| v as f64);
    }
    if let Ok(v) = raw.parse::<u128>() {
        return Some(v as f64);
    }
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_eighteen_decimals() {
        assert_eq!(normalize_balance(1_500_000_000_000_000_000.0, Some(18)), 1.5);
    }

    #[test]
    fn test_missing_or_zero_decimals_default_to_eighteen() {
        assert_eq!(normalize_balance(1_500_000_000_000_000_000.0, None), 1.5);
        assert_eq!(normalize_balance(1_500_000_000_000_000_000.0, Some(0)), 1.5);
        assert_eq!(effective_decimals(Some(255)), DEFAULT_DECIMALS);
    }

    #[test]
    fn test_normalize_six_decimals() {
        assert_eq!(normalize_balance(2_500_000.0, Some(6)), 2.5);
    }

    #[test]
    fn test_normalize_never_negative_or_nan() {
        assert_eq!(normalize_balance(-10.0, Some(6)), 0.0);
        assert_eq!(normalize_balance(f64::NAN, Some(6)), 0.0);
        assert_eq!(normalize_balance(f64::INFINITY, None), 0.0);
    }

    #[test]
    fn test_parse_raw_amount_formats() {
        assert_eq!(parse_raw_amount("1500000000000000000"), Some(1.5e18));
        assert_eq!(parse_raw_amount("1.5e+21"), Some(1.5e21));
        assert_eq!(parse_raw_amount("0x14d1120d7b160000"), Some(1.5e18));
        assert_eq!(parse_raw_amount("0x"), Some(0.0));
        assert_eq!(parse_raw_amount("not-a-number"), None);
        assert_eq!(parse_raw_amount("-3"), None);
    }
}
