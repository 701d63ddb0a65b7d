//! Test support for redstore: an in-memory [`Store`](redstore_backend::Store)
//! with Redis semantics, log capture and batch builders.

pub mod fixtures;
pub mod mock_store;
pub mod tracing;
