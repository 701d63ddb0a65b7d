//! Value encodings used when a resolved value is written to the store.
//!
//! | Format | Output | Reversible |
//! |--------|--------|------------|
//! | [`PlainFormat`] | strings verbatim, scalars as text, structures as JSON | Lossy for scalars |
//! | [`JsonFormat`] | compact JSON text | Yes |
//! | [`MessagePackFormat`] | MessagePack bytes | Yes |

use bytes::Bytes;
use redstore_core::{Raw, Value};
use thiserror::Error;

mod json;
mod msgpack;
mod plain;

pub use json::JsonFormat;
pub use msgpack::MessagePackFormat;
pub use plain::PlainFormat;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error(transparent)]
    Serialize(Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Deserialize(Box<dyn std::error::Error + Send + Sync>),
}

/// Object-safe value format.
///
/// Used as `Arc<dyn Format>` by the extractor so the encoding can be chosen at
/// configuration time.
pub trait Format: std::fmt::Debug + Send + Sync {
    /// Encodes a resolved value into the bytes that are sent to the store.
    fn encode(&self, value: &Value) -> Result<Raw, FormatError>;

    /// Decodes bytes produced by [`Format::encode`].
    fn decode(&self, data: &[u8]) -> Result<Value, FormatError>;
}

fn serialize_error(error: impl std::error::Error + Send + Sync + 'static) -> FormatError {
    FormatError::Serialize(Box::new(error))
}

fn deserialize_error(error: impl std::error::Error + Send + Sync + 'static) -> FormatError {
    FormatError::Deserialize(Box::new(error))
}

fn into_raw(buf: Vec<u8>) -> Raw {
    Bytes::from(buf)
}
