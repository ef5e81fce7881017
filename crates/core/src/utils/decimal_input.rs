//! Lenient decimal input for request models.
//!
//! Clients send prices either as JSON strings (`"45.00"`) or as JSON numbers
//! (`45.00`). Both are accepted; output keeps the string form.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Number;
use std::str::FromStr;

#[derive(Deserialize)]
#[serde(untagged)]
enum DecimalInput {
    String(String),
    Number(Number),
    Null,
}

fn parse_decimal_value(value: &str) -> Result<Decimal, String> {
    let trimmed = value.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|e| format!("Invalid decimal value '{}': {}", value, e))
}

pub fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    match DecimalInput::deserialize(deserializer)? {
        DecimalInput::String(s) => parse_decimal_value(&s).map_err(serde::de::Error::custom),
        DecimalInput::Number(n) => {
            parse_decimal_value(&n.to_string()).map_err(serde::de::Error::custom)
        }
        DecimalInput::Null => Err(serde::de::Error::custom("Decimal value is required")),
    }
}

pub fn deserialize_option_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<DecimalInput>::deserialize(deserializer)? {
        None | Some(DecimalInput::Null) => Ok(None),
        Some(DecimalInput::String(s)) if s.trim().is_empty() => Ok(None),
        Some(DecimalInput::String(s)) => parse_decimal_value(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
        Some(DecimalInput::Number(n)) => parse_decimal_value(&n.to_string())
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
