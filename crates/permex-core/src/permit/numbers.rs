//! Locale-tolerant decimal handling.
//!
//! Permits print decimals with a comma (`8,000` tonnes, `12,5` km). Every
//! numeric-producing rule goes through [`normalize_decimal`] before the value
//! is interpreted.

use std::str::FromStr;

use rust_decimal::Decimal;

/// Normalize a decimal token to dot form.
///
/// Spaces (including non-breaking ones) are removed. A lone comma becomes the
/// decimal point; when both separators occur the last one is the decimal
/// point and the other is dropped as a thousands separator.
pub fn normalize_decimal(token: &str) -> String {
    let cleaned: String = token
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(_), None) => cleaned.replace(',', "."),
        (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        _ => cleaned,
    }
}

/// Parse a decimal token after normalization; negative values are rejected.
pub fn parse_decimal(token: &str) -> Option<Decimal> {
    Decimal::from_str(&normalize_decimal(token))
        .ok()
        .filter(|d| !d.is_sign_negative())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comma_becomes_dot() {
        assert_eq!(normalize_decimal("8,000"), "8.000");
        assert_eq!(normalize_decimal("2,78"), "2.78");
        assert_eq!(normalize_decimal("19.5"), "19.5");
    }

    #[test]
    fn test_mixed_separators() {
        assert_eq!(normalize_decimal("1.234,5"), "1234.5");
        assert_eq!(normalize_decimal("1,234.5"), "1234.5");
        assert_eq!(normalize_decimal("1 234,50"), "1234.50");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for token in ["8,000", "1.234,5", "1,234.5", " 12 ,5 ", "7", "1,2,3", "abc", ""] {
            let once = normalize_decimal(token);
            assert_eq!(normalize_decimal(&once), once, "token {token:?}");
        }
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("2,780"), Some(Decimal::new(278, 2)));
        assert_eq!(parse_decimal("8,000"), Some(Decimal::new(8, 0)));
        assert_eq!(parse_decimal("-1,0"), None);
        assert_eq!(parse_decimal("n/a"), None);
    }
}
