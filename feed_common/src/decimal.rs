//! Lenient numeric field parsing for feed payloads.
//!
//! Prices and volumes arrive either as JSON numbers or as numeric strings. Both
//! are parsed from their textual form into `Decimal`, never through `f64`;
//! `serde_json` is built with `arbitrary_precision` so a number keeps the exact
//! digits it was sent with.
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Parse a decimal from text, accepting plain and scientific notation.
///
/// Digit separators (`1_000`) are rejected. Values finer than the 28 decimal
/// places `Decimal` can hold are rounded rather than rejected.
pub fn parse_decimal(text: &str) -> Result<Decimal, String> {
    let trimmed = text.trim();
    if trimmed.contains('_') {
        return Err(format!("invalid decimal '{}': digit separators are not allowed", trimmed));
    }
    match trimmed.split_once(['e', 'E']) {
        Some((mantissa, exponent)) => {
            let mantissa =
                Decimal::from_str(mantissa).map_err(|e| format!("invalid decimal '{}': {}", trimmed, e))?;
            let exponent = exponent
                .parse::<i64>()
                .map_err(|e| format!("invalid decimal '{}': {}", trimmed, e))?;
            scale_by_power_of_ten(mantissa, exponent)
                .ok_or_else(|| format!("invalid decimal '{}': out of range", trimmed))
        }
        None => Decimal::from_str(trimmed).map_err(|e| format!("invalid decimal '{}': {}", trimmed, e)),
    }
}

/// `value * 10^exponent`, rounding away digits past the maximum scale.
/// `None` on overflow.
fn scale_by_power_of_ten(mut value: Decimal, exponent: i64) -> Option<Decimal> {
    if exponent >= 0 {
        for _ in 0..exponent {
            value = value.checked_mul(Decimal::TEN)?;
        }
    } else {
        for _ in 0..exponent.unsigned_abs() {
            if value.is_zero() {
                break;
            }
            value = value.checked_div(Decimal::TEN)?;
        }
    }
    Some(value)
}

fn decimal_from_value(value: Value) -> Result<Option<Decimal>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => parse_decimal(&n.to_string()).map(Some),
        Value::String(s) => parse_decimal(&s).map(Some),
        other => Err(format!("expected a number or numeric string, got {}", other)),
    }
}

fn millis_from_value(value: Value) -> Result<Option<i64>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| format!("timestamp '{}' is not an integer", n)),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|e| format!("invalid timestamp '{}': {}", s, e)),
        other => Err(format!("expected an integer timestamp, got {}", other)),
    }
}

/// `deserialize_with` helper for optional decimal fields; `null` maps to `None`.
pub fn optional<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    decimal_from_value(value).map_err(D::Error::custom)
}

/// `deserialize_with` helper for decimal fields that must carry a value.
pub fn required<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    decimal_from_value(value)
        .map_err(D::Error::custom)?
        .ok_or_else(|| D::Error::custom("required decimal is null"))
}

/// `deserialize_with` helper for optional epoch-millisecond timestamps.
pub fn optional_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    millis_from_value(value).map_err(D::Error::custom)
}

/// `deserialize_with` helper for timestamps that must carry a value.
pub fn required_millis<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    millis_from_value(value)
        .map_err(D::Error::custom)?
        .ok_or_else(|| D::Error::custom("required timestamp is null"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use test_case::test_case;

    #[test_case("100.5", dec!(100.5) ; "plain")]
    #[test_case(" 0.01 ", dec!(0.01) ; "padded")]
    #[test_case("1e-5", dec!(0.00001) ; "scientific")]
    #[test_case("2.5E+3", dec!(2500) ; "scientific upper")]
    #[test_case("-3", dec!(-3) ; "negative integer")]
    fn parses_text(input: &str, expected: Decimal) {
        assert_eq!(parse_decimal(input).unwrap(), expected);
    }

    #[test_case("abc" ; "letters")]
    #[test_case("" ; "empty")]
    #[test_case("1_000" ; "digit separator")]
    #[test_case("1e" ; "missing exponent")]
    #[test_case("e5" ; "missing mantissa")]
    #[test_case("1e400" ; "overflow")]
    fn rejects(input: &str) {
        assert!(parse_decimal(input).is_err());
    }

    #[test]
    fn tiny_numbers_round_to_max_scale() {
        assert!(parse_decimal("5e-30").unwrap() <= Decimal::new(1, 28));
        assert_eq!(parse_decimal("1e-30").unwrap(), Decimal::ZERO);
        assert_eq!(parse_decimal("1e-28").unwrap(), Decimal::new(1, 28));
        assert_eq!(parse_decimal("1e-999999").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn tiny_json_number_is_accepted() {
        let value: Value = serde_json::from_str("5e-30").unwrap();
        assert!(decimal_from_value(value).unwrap().is_some());
    }

    #[test]
    fn json_number_keeps_its_digits() {
        let value: Value = serde_json::from_str("0.1000000000000000055511").unwrap();
        let parsed = decimal_from_value(value).unwrap().unwrap();
        assert_eq!(parsed.to_string(), "0.1000000000000000055511");
    }

    #[test]
    fn bool_is_not_a_decimal() {
        assert!(decimal_from_value(Value::Bool(true)).is_err());
    }

    #[test]
    fn millis_from_string_and_number() {
        assert_eq!(
            millis_from_value(serde_json::json!("1700000000000")).unwrap(),
            Some(1_700_000_000_000)
        );
        assert_eq!(
            millis_from_value(serde_json::json!(1_700_000_000_000i64)).unwrap(),
            Some(1_700_000_000_000)
        );
        assert_eq!(millis_from_value(Value::Null).unwrap(), None);
        assert!(millis_from_value(serde_json::json!(1.5)).is_err());
    }
}
