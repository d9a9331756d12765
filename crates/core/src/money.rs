use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

const CURRENCY_NOISE: [char; 6] = ['£', '$', '€', ',', ' ', '\u{00A0}'];

/// Parses an amount exactly as written. Accepts an optional leading `+`.
pub fn parse_plain(raw: &str) -> Option<Decimal> {
    let s = raw.trim();
    let s = s.strip_prefix('+').unwrap_or(s);
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s).ok()
}

/// Parses an amount, retrying once with currency symbols, thousands
/// separators and accounting parentheses removed.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    parse_plain(raw).or_else(|| parse_plain(&strip_currency(raw)))
}

/// Removes currency symbols and thousands separators. `(12.50)` becomes `-12.50`.
pub fn strip_currency(raw: &str) -> String {
    let s = raw.trim();
    let (negative, s) = match s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, s),
    };
    let cleaned: String = s.chars().filter(|c| !CURRENCY_NOISE.contains(c)).collect();
    if negative {
        format!("-{cleaned}")
    } else {
        cleaned
    }
}

/// Debit/credit columns: blank means zero, anything else must parse.
pub fn parse_optional_amount(raw: &str) -> Option<Decimal> {
    if strip_currency(raw).is_empty() {
        return Some(Decimal::ZERO);
    }
    parse_amount(raw)
}

pub fn to_f64(amount: Decimal) -> f64 {
    amount.to_f64().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn plain_amounts() {
        assert_eq!(parse_amount("45.60"), Some(dec("45.60")));
        assert_eq!(parse_amount("-12"), Some(dec("-12")));
        assert_eq!(parse_amount("+7.5"), Some(dec("7.5")));
    }

    #[test]
    fn currency_symbols_and_commas_retry() {
        assert_eq!(parse_amount("£1,234.56"), Some(dec("1234.56")));
        assert_eq!(parse_amount("-$99.99"), Some(dec("-99.99")));
        assert_eq!(parse_amount("€ 10"), Some(dec("10")));
    }

    #[test]
    fn accounting_parentheses_are_negative() {
        assert_eq!(parse_amount("(75.25)"), Some(dec("-75.25")));
    }

    #[test]
    fn garbage_and_empty_fail() {
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("£"), None);
    }

    #[test]
    fn optional_amount_blank_is_zero() {
        assert_eq!(parse_optional_amount(""), Some(Decimal::ZERO));
        assert_eq!(parse_optional_amount("  "), Some(Decimal::ZERO));
        assert_eq!(parse_optional_amount("£"), Some(Decimal::ZERO));
        assert_eq!(parse_optional_amount("n/a"), None);
        assert_eq!(parse_optional_amount("3.10"), Some(dec("3.10")));
    }

    #[test]
    fn to_f64_conversion() {
        assert_eq!(to_f64(dec("-45.60")), -45.6);
        assert_eq!(to_f64(Decimal::ZERO), 0.0);
    }
}
