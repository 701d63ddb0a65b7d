//! Error types for Redis store operations.
//!
//! All errors can be converted to [`StoreError`] so the sink reports them to
//! the host unchanged, whatever store is configured.
//!
//! [`StoreError`]: redstore_backend::StoreError

use std::time::Duration;

use redis::RedisError;
use redstore_backend::StoreError;

/// Error type for Redis store operations.
///
/// # When You'll Encounter This
///
/// - Using [`RedisStoreBuilder::build`] with a connection target that does not
///   form a valid Redis URL
/// - Writing the first batch when Redis is unreachable (the connection is
///   established lazily)
/// - Writing a batch when the server rejects the pipeline
///
/// [`RedisStoreBuilder::build`]: crate::RedisStoreBuilder::build
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An error from the underlying Redis client.
    ///
    /// This includes connection failures, protocol errors, authentication
    /// failures, and command execution errors.
    #[error("Redis store error: {0}")]
    Redis(#[from] RedisError),

    /// The connection could not be established within the connect timeout.
    #[error("Redis connection timed out after {0:?}")]
    Timeout(Duration),
}

impl Error {
    fn is_connection(&self) -> bool {
        match self {
            Error::Redis(error) => error.is_io_error() || error.is_connection_dropped(),
            Error::Timeout(_) => true,
        }
    }
}

impl From<Error> for StoreError {
    fn from(error: Error) -> Self {
        if error.is_connection() {
            Self::ConnectionError(Box::new(error))
        } else {
            Self::InternalError(Box::new(error))
        }
    }
}
