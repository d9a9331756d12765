use regex::Regex;
use std::sync::OnceLock;

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(slash_dmy, r"^(\d{1,2})/(\d{1,2})/(\d{4})$");
re!(iso_loose, r"^(\d{4})-(\d{1,2})-(\d{1,2})$");
re!(dash_dmy, r"^(\d{1,2})-(\d{1,2})-(\d{4})$");
re!(iso_strict, r"^\d{4}-\d{2}-\d{2}$");

fn wants_month_first(expected_format: &str) -> bool {
    expected_format.trim().eq_ignore_ascii_case("MM/DD/YYYY")
}

fn ymd(year: &str, month: &str, day: &str) -> String {
    format!("{year}-{month:0>2}-{day:0>2}")
}

/// Rewrites a bank date as zero-padded `YYYY-MM-DD`.
///
/// Recognised shapes, in order: `DD/MM/YYYY`, `YYYY-MM-DD`, `DD-MM-YYYY`.
/// Slash dates are read month-first only when `expected_format` is
/// `MM/DD/YYYY`. Anything else is returned unchanged. No calendar check is
/// made here.
pub fn normalize_date(raw: &str, expected_format: &str) -> String {
    let raw = raw.trim();

    if let Some(c) = slash_dmy().captures(raw) {
        return if wants_month_first(expected_format) {
            ymd(&c[3], &c[1], &c[2])
        } else {
            ymd(&c[3], &c[2], &c[1])
        };
    }
    if let Some(c) = iso_loose().captures(raw) {
        return ymd(&c[1], &c[2], &c[3]);
    }
    if let Some(c) = dash_dmy().captures(raw) {
        return ymd(&c[3], &c[2], &c[1]);
    }

    raw.to_string()
}

pub fn is_iso_date(date: &str) -> bool {
    iso_strict().is_match(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_first_slash() {
        assert_eq!(normalize_date("01/03/2024", "DD/MM/YYYY"), "2024-03-01");
        assert_eq!(normalize_date("1/3/2024", "DD/MM/YYYY"), "2024-03-01");
    }

    #[test]
    fn month_first_only_when_requested() {
        assert_eq!(normalize_date("03/01/2024", "MM/DD/YYYY"), "2024-03-01");
        assert_eq!(normalize_date("03/01/2024", "mm/dd/yyyy"), "2024-03-01");
        assert_eq!(normalize_date("03/01/2024", "YYYY-MM-DD"), "2024-01-03");
    }

    #[test]
    fn iso_is_zero_padded() {
        assert_eq!(normalize_date("2024-3-1", "DD/MM/YYYY"), "2024-03-01");
        assert_eq!(normalize_date(" 2024-12-25 ", "DD/MM/YYYY"), "2024-12-25");
    }

    #[test]
    fn day_first_dash() {
        assert_eq!(normalize_date("15-08-2023", "DD-MM-YYYY"), "2023-08-15");
    }

    #[test]
    fn unrecognised_passes_through() {
        assert_eq!(normalize_date("15 Aug 2023", "DD/MM/YYYY"), "15 Aug 2023");
        assert_eq!(normalize_date("2024/03/01", "DD/MM/YYYY"), "2024/03/01");
        assert!(!is_iso_date(&normalize_date("15 Aug 2023", "DD/MM/YYYY")));
    }

    #[test]
    fn strict_iso_check() {
        assert!(is_iso_date("2024-03-01"));
        assert!(!is_iso_date("2024-3-1"));
        assert!(!is_iso_date(""));
        // Shape only; calendar validity is not checked.
        assert!(is_iso_date("2024-13-45"));
    }
}
