use bytes::Bytes;
use redstore_core::{Raw, Value};

use super::{Format, FormatError, into_raw, serialize_error};

/// Plain format
///
/// Writes the resolved value as-is: strings verbatim, numbers and booleans as
/// their text, `null` as the empty string. Mappings and sequences have no
/// plain text form and are rendered as compact JSON.
///
/// Decoding tries JSON first and falls back to the raw text, so a string that
/// happens to look like a number comes back as a number.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainFormat;

impl Format for PlainFormat {
    fn encode(&self, value: &Value) -> Result<Raw, FormatError> {
        match value {
            Value::Null => Ok(Bytes::new()),
            Value::String(text) => Ok(Bytes::copy_from_slice(text.as_bytes())),
            Value::Bool(flag) => Ok(Bytes::from(flag.to_string())),
            Value::Number(number) => Ok(Bytes::from(number.to_string())),
            Value::Array(_) | Value::Object(_) => serde_json::to_vec(value)
                .map(into_raw)
                .map_err(serialize_error),
        }
    }

    fn decode(&self, data: &[u8]) -> Result<Value, FormatError> {
        Ok(serde_json::from_slice(data)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(data).into_owned())))
    }
}
