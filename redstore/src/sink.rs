//! Host-facing entry points.

use bytes::Bytes;
use chrono::Utc;
use redstore_backend::{Pipeline, Store};
use redstore_core::{EventTime, Record};
use tracing::{debug, error, warn};

use crate::codec::RecordCodec;
use crate::dispatcher::{Dispatch, OperationDispatcher};
use crate::error::{CodecError, ExtractError, SinkError};
use crate::metrics::{self, Timer};

/// Per-record outcome counts of one batch.
///
/// A batch with dropped records is still reported as written; the counts are
/// informational.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteReport {
    /// Records whose commands were sent.
    pub written: usize,
    /// Records rejected by the character-class filter.
    pub skipped: usize,
    /// Records dropped after a recoverable error.
    pub dropped: usize,
}

impl WriteReport {
    /// Number of entries decoded from the chunk.
    pub fn total(&self) -> usize {
        self.written + self.skipped + self.dropped
    }

    fn count(&mut self, dispatch: Dispatch) {
        match dispatch {
            Dispatch::Queued => self.written += 1,
            Dispatch::Skipped => self.skipped += 1,
            Dispatch::Dropped => self.dropped += 1,
        }
    }
}

/// Redis output of the host pipeline.
///
/// One sink serves one configured [`StoreKind`](crate::StoreKind). `write`
/// takes `&self`, so the host may run several batch writers over the same
/// sink when the store supports concurrent use.
#[derive(Debug, Clone)]
pub struct RedisSink<S> {
    store: S,
    dispatcher: OperationDispatcher,
}

impl<S> RedisSink<S>
where
    S: Store,
{
    /// Creates a sink writing through `store`.
    pub fn new(store: S, dispatcher: OperationDispatcher) -> Self {
        Self { store, dispatcher }
    }

    /// Underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Record dispatcher.
    pub fn dispatcher(&self) -> &OperationDispatcher {
        &self.dispatcher
    }

    /// Buffered representation of one event, as the host stores it.
    pub fn format(&self, tag: &str, time: EventTime, record: &Record) -> Result<Bytes, CodecError> {
        RecordCodec::encode(tag, time, record)
    }

    /// Writes one buffered chunk.
    ///
    /// Every decoded record is dispatched in order into a single pipeline,
    /// which is sent in one round trip. An empty key or a corrupt chunk aborts
    /// the batch before anything is sent, so the host can retry it. A
    /// truncated trailing entry ends the chunk. Any other per-record failure
    /// only drops the record.
    pub async fn write(&self, chunk: &[u8]) -> Result<WriteReport, SinkError> {
        let timer = Timer::new();
        let span = self.dispatcher.span();
        let now = Utc::now().timestamp();
        let mut pipeline = Pipeline::new();
        let mut report = WriteReport::default();

        for item in RecordCodec::decode(chunk) {
            let entry = match item {
                Ok(entry) => entry,
                Err(err) if err.is_fatal() => {
                    error!(parent: span, reason = %err, "Abort batch on corrupt chunk");
                    return Err(SinkError::Codec(err));
                }
                Err(err) => {
                    warn!(parent: span, reason = %err, "Drop undecodable entry");
                    report.dropped += 1;
                    continue;
                }
            };

            match self.dispatcher.dispatch(&entry, now, &mut pipeline) {
                Ok(dispatch) => report.count(dispatch),
                Err(ExtractError::EmptyKey) => {
                    error!(parent: span, tag = entry.tag(), "Abort batch on empty key");
                    return Err(SinkError::EmptyKey);
                }
                Err(err) => {
                    warn!(parent: span, tag = entry.tag(), reason = %err, "Drop record");
                    report.dropped += 1;
                }
            }
        }

        let commands = pipeline.len();
        self.store.execute(pipeline).await?;

        debug!(
            parent: span,
            store = self.store.name(),
            commands,
            written = report.written,
            skipped = report.skipped,
            dropped = report.dropped,
            "Batch written"
        );
        metrics::record_batch(
            self.store.name(),
            report.written as u64,
            report.skipped as u64,
            report.dropped as u64,
            timer.elapsed(),
        );
        Ok(report)
    }
}
