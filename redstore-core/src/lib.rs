#![warn(missing_docs)]
//! # redstore-core
//!
//! Core types shared by every redstore crate.
//!
//! This crate knows nothing about Redis or about the host pipeline. It
//! provides the pieces the mapping engine is built from:
//!
//! - **Model** buffered events ([`Entry`], [`Value`], [`EventTime`])
//! - **Address** nested record fields ([`FieldPath`])
//! - **Shape** values before they are written ([`ValueTransformer`])
//! - **Name** sink instances for logs and metrics ([`SinkLabel`])

pub mod label;
pub mod path;
pub mod record;
pub mod transform;

pub use label::SinkLabel;
pub use path::{FieldPath, PathError};
pub use record::{Entry, EventTime, Record, Value};
pub use transform::{Transformed, Unescape, ValueTransformer};

/// Raw byte data type used for encoded values.
pub type Raw = bytes::Bytes;
