//! Lenient deserializers for storefront API payloads.
//!
//! The catalog API is not consistent about scalar encodings: identifiers show
//! up as strings or integers, prices as numbers or numeric strings, and
//! optional fields as `null`, `""`, or missing entirely. These helpers accept
//! every observed encoding. Required fields reject garbage so the whole record
//! can be skipped upstream; optional fields degrade to `None`.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Accepts a string or integer identifier.
pub fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    id_from_value(&value)
        .ok_or_else(|| D::Error::custom(format!("expected string or number id, got {value}")))
}

/// Accepts a JSON number or a numeric string.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    number_from_value(&value)
        .ok_or_else(|| D::Error::custom(format!("expected a number, got {value}")))
}

/// Like [`lenient_f64`] but maps `null` and unparseable values to `None`.
pub fn opt_lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(number_from_value(&value))
}

/// Non-negative count. Negative, fractional-negative, or malformed values become `0`.
pub fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(count_from_value(&value).unwrap_or(0))
}

/// Positive quantity. Zero, negative, or malformed values are rejected.
pub fn positive_quantity<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match count_from_value(&value) {
        Some(q) if q > 0 => Ok(q),
        _ => Err(D::Error::custom(format!(
            "expected a positive quantity, got {value}"
        ))),
    }
}

/// Optional string where `null`, `""`, and non-strings all mean "absent".
pub fn opt_non_empty_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}

/// JSON object, or an empty map for `null` and any other non-object.
pub fn object_or_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Object(map) => map,
        _ => Map::new(),
    })
}

/// Display string. `null` and non-string scalars other than numbers become `""`.
pub fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// Flag that defaults to `true` for `null` and any non-boolean.
pub fn bool_or_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_bool().unwrap_or(true))
}

/// Treats `null` as `T::default()`; any other value must deserialize as `T`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub(crate) fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn count_from_value(value: &Value) -> Option<u32> {
    let n = number_from_value(value)?;
    if n < 0.0 {
        return None;
    }
    Some(n.min(f64::from(u32::MAX)).floor() as u32)
}
