//! Lenient numeric deserialization for values ingested from data sources.
//!
//! REST resource servers like `json-server` store whatever the client posted,
//! so numeric fields sometimes come back as strings (`"42"` instead of `42`).
//! These helpers accept both shapes and convert once, at the boundary.

use serde::de::{self, Deserializer};
use serde::Deserialize;

/// A number or a string that should contain one.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Int(i64),
    Text(String),
}

impl RawNumber {
    fn into_i64(self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(n),
            Self::Text(s) => s.trim().parse::<i64>().ok(),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Int(n) => n.to_string(),
            Self::Text(s) => format!("\"{s}\""),
        }
    }
}

/// Deserialize an `i64` from a JSON number or a numeric string.
///
/// # Errors
///
/// Fails if the value is neither an integer nor a string holding one.
pub fn deserialize_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = RawNumber::deserialize(deserializer)?;
    let shown = raw.describe();
    raw.into_i64()
        .ok_or_else(|| de::Error::custom(format!("expected an integer, got {shown}")))
}

/// Deserialize a non-negative `u32` from a JSON number or a numeric string.
///
/// Negative values are rejected here so that stock can never be stored
/// below zero.
///
/// # Errors
///
/// Fails on non-numeric input, negative values, or values above `u32::MAX`.
pub fn deserialize_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = deserialize_i64(deserializer)?;
    u32::try_from(value)
        .map_err(|_| de::Error::custom(format!("expected a non-negative count, got {value}")))
}

/// Deserialize an optional `i64`, mapping unparseable strings to `None`.
///
/// Used for owner references, where legacy records carry placeholders such
/// as `"anonymous"`.
///
/// # Errors
///
/// Fails only if the value is neither null, a number, nor a string.
pub fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawNumber>::deserialize(deserializer)?;
    Ok(raw.and_then(RawNumber::into_i64))
}
