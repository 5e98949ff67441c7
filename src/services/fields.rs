// Coercions for loosely typed JSON request fields.
//
// Form-driven clients send numbers as strings and clear optional fields by
// sending "". Absent, null and "" are all treated as "not supplied".

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;
use std::str::FromStr;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Money columns are `NUMERIC(12, 2)`.
pub const AMOUNT_SCALE: u32 = 2;
pub const AMOUNT_MAX_INTEGER_DIGITS: u32 = 10;

pub fn is_absent(value: &Option<Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// `None` when absent; `Err` when present but not a string.
pub fn text(value: &Option<Value>) -> Result<Option<String>, &'static str> {
    if is_absent(value) {
        return Ok(None);
    }
    match value {
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        _ => Err("Must be a string"),
    }
}

/// Positive integer id from a number or a numeric string.
pub fn id(value: &Option<Value>) -> Result<Option<i64>, &'static str> {
    if is_absent(value) {
        return Ok(None);
    }
    let parsed = match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match parsed {
        Some(id) if id >= 1 => Ok(Some(id)),
        _ => Err("Must be a positive integer"),
    }
}

/// Non-negative decimal from a number or a numeric string, rounded to
/// cents and bounded by the column precision.
pub fn amount(value: &Option<Value>) -> Result<Option<Decimal>, &'static str> {
    if is_absent(value) {
        return Ok(None);
    }
    let parsed = match value {
        Some(Value::Number(n)) => parse_decimal(&n.to_string()),
        Some(Value::String(s)) => parse_decimal(s.trim()),
        _ => None,
    };
    match parsed {
        Some(amount) if amount < Decimal::ZERO => Err("Must not be negative"),
        Some(amount) => {
            let amount = amount.round_dp_with_strategy(
                AMOUNT_SCALE,
                RoundingStrategy::MidpointAwayFromZero,
            );
            if amount >= Decimal::from(10_i64.pow(AMOUNT_MAX_INTEGER_DIGITS)) {
                Err("Must be less than 10000000000")
            } else {
                Ok(Some(amount))
            }
        }
        None => Err("Must be a number"),
    }
}

/// Calendar date in `YYYY-MM-DD` form.
pub fn date(value: &Option<Value>) -> Result<Option<NaiveDate>, &'static str> {
    if is_absent(value) {
        return Ok(None);
    }
    match value {
        Some(Value::String(s)) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
            .map(Some)
            .map_err(|_| "Must be a date in YYYY-MM-DD format"),
        _ => Err("Must be a date in YYYY-MM-DD format"),
    }
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_strings_are_absent() {
        assert!(is_absent(&None));
        assert!(is_absent(&Some(Value::Null)));
        assert!(is_absent(&Some(json!("  "))));
        assert!(!is_absent(&Some(json!(0))));
        assert_eq!(date(&Some(json!(""))), Ok(None));
    }

    #[test]
    fn ids_accept_numbers_and_numeric_strings() {
        assert_eq!(id(&Some(json!(3))), Ok(Some(3)));
        assert_eq!(id(&Some(json!("12"))), Ok(Some(12)));
        assert!(id(&Some(json!(0))).is_err());
        assert!(id(&Some(json!(-4))).is_err());
        assert!(id(&Some(json!("abc"))).is_err());
        assert!(id(&Some(json!(1.5))).is_err());
    }

    #[test]
    fn amounts_are_non_negative_decimals() {
        assert_eq!(amount(&Some(json!(1500.5))), Ok(Some(Decimal::new(15005, 1))));
        assert_eq!(amount(&Some(json!("42"))), Ok(Some(Decimal::new(42, 0))));
        assert_eq!(amount(&Some(json!(0))), Ok(Some(Decimal::ZERO)));
        assert!(amount(&Some(json!(-1))).is_err());
        assert!(amount(&Some(json!(true))).is_err());
    }

    #[test]
    fn amounts_fit_the_money_column() {
        assert_eq!(amount(&Some(json!("10.005"))), Ok(Some(Decimal::new(1001, 2))));
        assert_eq!(
            amount(&Some(json!("9999999999.99"))),
            Ok(Some(Decimal::new(999_999_999_999, 2)))
        );
        assert!(amount(&Some(json!(100_000_000_000_i64))).is_err());
        assert!(amount(&Some(json!("1e12"))).is_err());
        // Rounds up into the overflow range
        assert!(amount(&Some(json!("9999999999.999"))).is_err());
    }

    #[test]
    fn dates_use_iso_calendar_format() {
        assert_eq!(
            date(&Some(json!("2024-02-29"))),
            Ok(NaiveDate::from_ymd_opt(2024, 2, 29))
        );
        assert!(date(&Some(json!("29.02.2024"))).is_err());
        assert!(date(&Some(json!("2023-02-29"))).is_err());
    }
}
