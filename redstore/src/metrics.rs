//! Sink metrics.
//!
//! Enable the `metrics` feature to record them; without it every function
//! here is a no-op.
//!
//! All metrics carry a `sink` label and follow the pattern
//! `redstore_{subject}_{metric_type}`:
//!
//! - `redstore_records_{written,skipped,dropped}_total` - per-record outcomes
//! - `redstore_batch_duration_seconds` - time to dispatch and send one batch

use std::time::Duration;

#[cfg(feature = "metrics")]
use std::time::Instant;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

/// Zero-cost timer for metrics collection.
///
/// Captures the start time only when the `metrics` feature is enabled.
pub struct Timer {
    #[cfg(feature = "metrics")]
    start: Instant,
}

impl Timer {
    /// Starts a new timer.
    #[inline]
    pub fn new() -> Self {
        Self {
            #[cfg(feature = "metrics")]
            start: Instant::now(),
        }
    }

    /// Elapsed time, or `Duration::ZERO` without the `metrics` feature.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        #[cfg(feature = "metrics")]
        {
            self.start.elapsed()
        }
        #[cfg(not(feature = "metrics"))]
        {
            Duration::ZERO
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "metrics")]
lazy_static! {
    /// Metric name for written records counter.
    pub static ref RECORDS_WRITTEN: &'static str = {
        metrics::describe_counter!(
            "redstore_records_written_total",
            "Records whose commands were sent to the store."
        );
        "redstore_records_written_total"
    };

    /// Metric name for filtered records counter.
    pub static ref RECORDS_SKIPPED: &'static str = {
        metrics::describe_counter!(
            "redstore_records_skipped_total",
            "Records rejected by the character-class filter."
        );
        "redstore_records_skipped_total"
    };

    /// Metric name for dropped records counter.
    pub static ref RECORDS_DROPPED: &'static str = {
        metrics::describe_counter!(
            "redstore_records_dropped_total",
            "Records dropped after a recoverable error."
        );
        "redstore_records_dropped_total"
    };

    /// Metric name for batch duration histogram.
    pub static ref BATCH_DURATION: &'static str = {
        metrics::describe_histogram!(
            "redstore_batch_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of one batch write in seconds."
        );
        "redstore_batch_duration_seconds"
    };
}

/// Record the outcome counts and duration of one batch.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_batch(sink: &str, written: u64, skipped: u64, dropped: u64, duration: Duration) {
    metrics::counter!(*RECORDS_WRITTEN, "sink" => sink.to_string()).increment(written);
    metrics::counter!(*RECORDS_SKIPPED, "sink" => sink.to_string()).increment(skipped);
    metrics::counter!(*RECORDS_DROPPED, "sink" => sink.to_string()).increment(dropped);
    metrics::histogram!(*BATCH_DURATION, "sink" => sink.to_string())
        .record(duration.as_secs_f64());
}

/// Record one batch (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_batch(_sink: &str, _written: u64, _skipped: u64, _dropped: u64, _duration: Duration) {}
