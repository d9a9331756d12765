use chrono::{Datelike, NaiveDate};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// The month a transaction is budgeted against. `Current` means "whatever
/// month the import is confirmed in" and is resolved at export time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BudgetMonth {
    Month(u32),
    #[default]
    Current,
}

impl BudgetMonth {
    /// Month component of an ISO `YYYY-MM-DD` date, or `Current` when the
    /// date is not a real calendar date.
    pub fn from_iso_date(date: &str) -> Self {
        parse_iso(date)
            .map(|d| BudgetMonth::Month(d.month()))
            .unwrap_or(BudgetMonth::Current)
    }

    pub fn month(self) -> Option<u32> {
        match self {
            BudgetMonth::Month(m) => Some(m),
            BudgetMonth::Current => None,
        }
    }
}

impl fmt::Display for BudgetMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BudgetMonth::Month(m) => write!(f, "{m}"),
            BudgetMonth::Current => write!(f, "current"),
        }
    }
}

impl Serialize for BudgetMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BudgetMonth::Month(m) => serializer.serialize_u32(*m),
            BudgetMonth::Current => serializer.serialize_str("current"),
        }
    }
}

impl<'de> Deserialize<'de> for BudgetMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BudgetMonthVisitor;

        impl<'de> Visitor<'de> for BudgetMonthVisitor {
            type Value = BudgetMonth;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a month number 1-12 or \"current\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<BudgetMonth, E> {
                match v {
                    1..=12 => Ok(BudgetMonth::Month(v as u32)),
                    _ => Err(E::custom(format!("month out of range: {v}"))),
                }
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<BudgetMonth, E> {
                if v < 0 {
                    return Err(E::custom(format!("month out of range: {v}")));
                }
                self.visit_u64(v as u64)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<BudgetMonth, E> {
                if v.eq_ignore_ascii_case("current") {
                    return Ok(BudgetMonth::Current);
                }
                v.parse::<u64>()
                    .map_err(|_| E::custom(format!("invalid budget month: {v}")))
                    .and_then(|n| self.visit_u64(n))
            }
        }

        deserializer.deserialize_any(BudgetMonthVisitor)
    }
}

/// Budget month and year for an ISO date, falling back to `today` when the
/// date does not parse.
pub fn budget_period(date: &str, today: NaiveDate) -> (u32, i32) {
    match parse_iso(date) {
        Some(d) => (d.month(), d.year()),
        None => (today.month(), today.year()),
    }
}

pub fn parse_iso(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_from_iso_date() {
        assert_eq!(BudgetMonth::from_iso_date("2024-03-01"), BudgetMonth::Month(3));
        assert_eq!(BudgetMonth::from_iso_date("2024-12-31"), BudgetMonth::Month(12));
    }

    #[test]
    fn unparseable_date_is_current() {
        assert_eq!(BudgetMonth::from_iso_date("2024-13-01"), BudgetMonth::Current);
        assert_eq!(BudgetMonth::from_iso_date("yesterday"), BudgetMonth::Current);
        assert_eq!(BudgetMonth::from_iso_date(""), BudgetMonth::Current);
    }

    #[test]
    fn serializes_as_number_or_current() {
        assert_eq!(serde_json::to_string(&BudgetMonth::Month(7)).unwrap(), "7");
        assert_eq!(serde_json::to_string(&BudgetMonth::Current).unwrap(), "\"current\"");
    }

    #[test]
    fn deserializes_both_shapes() {
        let m: BudgetMonth = serde_json::from_str("11").unwrap();
        assert_eq!(m, BudgetMonth::Month(11));
        let m: BudgetMonth = serde_json::from_str("\"current\"").unwrap();
        assert_eq!(m, BudgetMonth::Current);
        let m: BudgetMonth = serde_json::from_str("\"4\"").unwrap();
        assert_eq!(m, BudgetMonth::Month(4));
        assert!(serde_json::from_str::<BudgetMonth>("13").is_err());
    }

    #[test]
    fn budget_period_falls_back_to_today() {
        let today = day(2025, 6, 15);
        assert_eq!(budget_period("2024-03-01", today), (3, 2024));
        assert_eq!(budget_period("not a date", today), (6, 2025));
    }
}
