//! Buffered event model.
//!
//! A record is a string-keyed mapping whose values may nest arbitrarily deep.
//! Values are the tagged [`serde_json::Value`] variant, so every consumer
//! pattern-matches on the shape instead of probing for methods.

use smol_str::SmolStr;

pub use serde_json::Value;

/// Root mapping of a single event.
pub type Record = serde_json::Map<String, Value>;

/// Event timestamp in integer epoch seconds.
pub type EventTime = i64;

/// One buffered event: routing tag, ingestion time and record.
///
/// The record is kept as a [`Value::Object`] so field paths resolve against it
/// directly; the empty path yields the whole record.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    tag: SmolStr,
    time: EventTime,
    record: Value,
}

impl Entry {
    /// Creates a new entry.
    pub fn new(tag: impl Into<SmolStr>, time: EventTime, record: Record) -> Self {
        Self {
            tag: tag.into(),
            time,
            record: Value::Object(record),
        }
    }

    /// Routing tag assigned by the host.
    #[inline]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Ingestion time in epoch seconds.
    #[inline]
    pub fn time(&self) -> EventTime {
        self.time
    }

    /// The record as a value, always a mapping.
    #[inline]
    pub fn record(&self) -> &Value {
        &self.record
    }
}
