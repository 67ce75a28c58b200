//! Form and LLM payloads carry numbers in every shape: integers, floats,
//! numeric strings, empty strings and nulls. These deserializers accept all
//! of them and map anything blank to `None`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn value_to_f64<E: serde::de::Error>(value: Value) -> Result<Option<f64>, E> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_f64()),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .trim_end_matches("kg")
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(E::custom),
        other => Err(E::custom(format!("expected a number, got {}", other))),
    }
}

pub fn optional_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?.unwrap_or(Value::Null);
    value_to_f64(value)
}

pub fn optional_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?.unwrap_or(Value::Null);
    Ok(value_to_f64(value)?.map(|n| n.round() as i32))
}

pub fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?.unwrap_or(Value::Null);
    Ok(match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}
