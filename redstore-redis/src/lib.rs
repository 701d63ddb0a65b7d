#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]
//! Redis [`Store`] for the redstore sink.
//!
//! [`RedisStore`] translates each [`Command`] of a pipeline into its Redis
//! counterpart and sends the batch in one round trip over a lazily
//! established [`ConnectionManager`].
//!
//! [`Store`]: redstore_backend::Store
//! [`Command`]: redstore_backend::Command
//! [`ConnectionManager`]: redis::aio::ConnectionManager

pub mod error;
pub mod store;

#[doc(inline)]
pub use crate::error::Error;
#[doc(inline)]
pub use crate::store::{ConnectionMode, RedisStore, RedisStoreBuilder};
