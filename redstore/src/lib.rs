#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]
//! # redstore
//!
//! Log-forwarding sink that maps buffered records onto Redis data structures.
//!
//! The host pipeline hands [`RedisSink::write`] a chunk of buffered entries.
//! Each entry is decoded, a key, value and score are derived from its record,
//! the value is shaped by the configured transforms and the commands of the
//! configured [`StoreKind`] are appended to one pipeline, followed by the
//! expiration and size bounds of the [`BoundPolicy`]. The pipeline is sent to
//! the [`Store`](redstore_backend::Store) in a single round trip.
//!
//! ```no_run
//! use redstore::{KeySource, KeyValueExtractor, OperationDispatcher, RedisSink, StoreKind};
//! # async fn run(store: impl redstore::backend::Store, chunk: &[u8]) -> Result<(), redstore::SinkError> {
//! let extractor = KeyValueExtractor::new(KeySource::Path("user".parse().unwrap()));
//! let dispatcher = OperationDispatcher::new(StoreKind::String, extractor, tracing::Span::current());
//! let sink = RedisSink::new(store, dispatcher);
//! let report = sink.write(chunk).await?;
//! # Ok(())
//! # }
//! ```

/// Host buffer codec.
pub mod codec;

/// Per-record command selection.
pub mod dispatcher;

/// Error types for decoding, extraction and batch writes.
pub mod error;

/// Key, value and score derivation.
pub mod extractor;

/// Metrics collection, recorded when the `metrics` feature is enabled.
pub mod metrics;

/// Expiration and size bounds.
pub mod policy;

/// Host-facing entry points.
pub mod sink;

pub use codec::{Entries, RecordCodec};
pub use dispatcher::{Dispatch, OperationDispatcher, StoreKind};
pub use error::{CodecError, ExtractError, SinkError};
pub use extractor::{ExtractedTriple, KeySource, KeyValueExtractor, ScoreSource};
pub use policy::{BoundPolicy, Order};
pub use sink::{RedisSink, WriteReport};

pub use redstore_core::{
    Entry, EventTime, FieldPath, PathError, Record, SinkLabel, Unescape, Value, ValueTransformer,
};

/// Store-related re-exports.
pub mod backend {
    pub use redstore_backend::{
        Command, Format, FormatError, JsonFormat, MessagePackFormat, Pipeline,
        PlainFormat, ScoreBound, Store, StoreError, StoreResult,
    };
}
