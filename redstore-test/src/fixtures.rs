//! Builders for records and buffered chunks.

use redstore::RecordCodec;
use redstore_core::{EventTime, Record, Value};

/// Unwraps a JSON object into a [`Record`].
///
/// Panics on anything else.
pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("record must be an object, got {other}"),
    }
}

/// Buffers every record as the host would and concatenates the result.
pub fn chunk<I>(entries: I) -> Vec<u8>
where
    I: IntoIterator<Item = (&'static str, EventTime, Value)>,
{
    entries
        .into_iter()
        .flat_map(|(tag, time, value)| {
            RecordCodec::encode(tag, time, &record(value))
                .unwrap()
                .to_vec()
        })
        .collect()
}

/// A chunk of records that share one tag and time.
pub fn chunk_of<I>(records: I) -> Vec<u8>
where
    I: IntoIterator<Item = Value>,
{
    chunk(records.into_iter().map(|value| ("test", 1_000_000, value)))
}
