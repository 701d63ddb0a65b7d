use redstore_core::{Raw, Value};

use super::{Format, FormatError, deserialize_error, into_raw, serialize_error};

/// MessagePack format
///
/// Compact and self-describing, so any record shape decodes back without a
/// schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessagePackFormat;

impl Format for MessagePackFormat {
    fn encode(&self, value: &Value) -> Result<Raw, FormatError> {
        rmp_serde::to_vec(value)
            .map(into_raw)
            .map_err(serialize_error)
    }

    fn decode(&self, data: &[u8]) -> Result<Value, FormatError> {
        rmp_serde::from_slice(data).map_err(deserialize_error)
    }
}
