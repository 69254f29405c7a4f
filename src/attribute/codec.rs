//! Attribute value encoding.
//!
//! Attribute values are strings. `null` is reflected as "no attribute" and
//! non-strings as JSON. Strings are reflected verbatim unless their text
//! would itself parse as JSON (`"5"`, `"null"`, `"true"`), in which case they
//! are quoted so they come back as strings. Parsing is best-effort: JSON
//! first, then the raw text as a string.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Serialize a property value into its attribute text. `None` means the
/// attribute should be absent.
pub fn stringify<T: Serialize>(value: &T) -> Option<String> {
    match serde_json::to_value(value).ok()? {
        Value::Null => None,
        Value::String(s) if serde_json::from_str::<Value>(&s).is_err() => Some(s),
        Value::String(s) => serde_json::to_string(&s).ok(),
        other => Some(other.to_string()),
    }
}

/// Recover a property value from attribute text.
pub fn parse<T: DeserializeOwned>(raw: &str) -> Result<T, serde_json::Error> {
    if let Ok(json) = serde_json::from_str::<Value>(raw) {
        if let Ok(value) = serde_json::from_value::<T>(json) {
            return Ok(value);
        }
    }
    serde_json::from_value(Value::String(raw.to_owned()))
}

/// Recover the value for a removed attribute, if the type admits one.
pub fn parse_absent<T: DeserializeOwned>() -> Option<T> {
    serde_json::from_value(Value::Null).ok()
}
