#![warn(missing_docs)]
//! Configuration support for the redstore sink.
//!
//! A [`SinkConfig`] is deserialized from YAML, validated once at startup and
//! turned into a ready [`RedisSink`](redstore::RedisSink):
//!
//! ```no_run
//! use redstore_configuration::SinkConfig;
//!
//! let config = SinkConfig::from_yaml(
//!     r#"
//! host: 127.0.0.1
//! store_type: list
//! key_path: user
//! value_length: 100
//! "#,
//! )?;
//! let sink = config.into_sink()?;
//! # Ok::<(), redstore_configuration::ConfigError>(())
//! ```

pub mod connection;
/// Configuration errors.
pub mod error;
pub mod sink;

pub use connection::ConnectionConfig;
pub use error::ConfigError;
pub use sink::{FormatType, SinkConfig, SortOrder, StoreType};
