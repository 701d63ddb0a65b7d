use redstore_core::{Raw, Value};

use super::{Format, FormatError, deserialize_error, into_raw, serialize_error};

/// JSON format
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl Format for JsonFormat {
    fn encode(&self, value: &Value) -> Result<Raw, FormatError> {
        serde_json::to_vec(value)
            .map(into_raw)
            .map_err(serialize_error)
    }

    fn decode(&self, data: &[u8]) -> Result<Value, FormatError> {
        serde_json::from_slice(data).map_err(deserialize_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encodes_compact_json() {
        let value = json!({"user": "george", "stat": {"attack": 7}});
        let encoded = JsonFormat.encode(&value).unwrap();
        assert_eq!(&encoded[..], br#"{"user":"george","stat":{"attack":7}}"#);
    }

    #[test]
    fn test_string_is_quoted() {
        let encoded = JsonFormat.encode(&json!("george")).unwrap();
        assert_eq!(&encoded[..], br#""george""#);
    }

    #[test]
    fn test_decode_error() {
        assert!(matches!(
            JsonFormat.decode(b"{not json"),
            Err(FormatError::Deserialize(_))
        ));
    }
}
