//! Error types for the mapping engine.
//!
//! Errors fall into two groups. [`ExtractError::EmptyKey`] is a configuration
//! contract violation and [`CodecError::Decode`] means a corrupt chunk; both
//! abort the whole batch. Every other error is scoped
//! to one record: it is logged, the record is dropped and the batch goes on.

use redstore_backend::{FormatError, StoreError};
use redstore_core::FieldPath;
use thiserror::Error;

/// Failure to derive a key, value or score from a record.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The key resolved to the empty string after prefix and suffix were
    /// applied.
    #[error("key is empty")]
    EmptyKey,

    /// The score path is missing or does not hold a number.
    #[error("score at `{path}` is missing or not numeric")]
    InvalidScore {
        /// Configured score path.
        path: FieldPath,
    },

    /// The resolved value could not be encoded.
    #[error(transparent)]
    Format(#[from] FormatError),
}

impl ExtractError {
    /// Returns `true` for errors that must abort the batch.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExtractError::EmptyKey)
    }
}

/// Failure to decode or encode the host's buffered entries.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The byte stream is not valid MessagePack. The rest of the chunk can
    /// not be resynchronized.
    #[error("failed to decode buffered entry: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// The entry decoded but does not have the `[tag, time, record]` shape.
    #[error("malformed buffered entry: {0}")]
    Malformed(&'static str),

    /// The entry could not be encoded.
    #[error("failed to encode buffered entry: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
}

impl CodecError {
    /// Returns `true` for errors that must abort the batch.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CodecError::Decode(_))
    }
}

/// Failure of a whole batch write, reported to the host.
#[derive(Debug, Error)]
pub enum SinkError {
    /// A record produced an empty key. Nothing from the batch was sent.
    #[error("key is empty")]
    EmptyKey,

    /// The chunk holds bytes that are not MessagePack. Nothing from the batch
    /// was sent.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The store rejected or failed to receive the batch.
    #[error(transparent)]
    Store(#[from] StoreError),
}
