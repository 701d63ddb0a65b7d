//! Traits and structs for store interaction.
//!
//! The mapping engine never talks to Redis directly. It fills a [`Pipeline`]
//! with [`Command`]s and hands it to a [`Store`], which sends the whole batch
//! in one round trip. If you want to implement your own store, you are in the
//! right place.
mod command;
pub mod format;
mod store;

pub use command::{Command, Pipeline, ScoreBound};
pub use format::{Format, FormatError, JsonFormat, MessagePackFormat, PlainFormat};
pub use store::{Store, StoreResult};
use thiserror::Error;

/// Proxy Error describes general groups of errors in store interaction process.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Internal store error, state or computation error.
    ///
    /// Any error not bounded with network interaction.
    #[error(transparent)]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
    /// Network interaction error.
    #[error(transparent)]
    ConnectionError(Box<dyn std::error::Error + Send + Sync>),
    /// Serializing\Deserializing data error.
    #[error(transparent)]
    FormatError(#[from] FormatError),
}
