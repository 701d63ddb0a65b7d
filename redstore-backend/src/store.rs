use std::sync::Arc;

use async_trait::async_trait;

use crate::{Pipeline, StoreError};

pub type StoreResult<T> = Result<T, StoreError>;

/// A data store that executes a batch of commands in one round trip.
///
/// Individual command replies are not inspected; an error means the batch as
/// a whole could not be delivered. Implementations must be safe to share
/// between concurrent batch writers.
#[async_trait]
pub trait Store: Sync + Send {
    async fn execute(&self, pipeline: Pipeline) -> StoreResult<()>;

    /// Returns the name of this store, used in log spans and metric labels.
    fn name(&self) -> &str {
        "store"
    }
}

#[async_trait]
impl<T> Store for Arc<T>
where
    T: Store + ?Sized,
{
    async fn execute(&self, pipeline: Pipeline) -> StoreResult<()> {
        (**self).execute(pipeline).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl Store for Box<dyn Store> {
    async fn execute(&self, pipeline: Pipeline) -> StoreResult<()> {
        (**self).execute(pipeline).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
