//! Host buffer codec.
//!
//! The host buffers every event as a MessagePack array `[tag, time, record]`
//! and hands a chunk of concatenated arrays to [`RedisSink::write`]. Older
//! buffers hold `["tag.time", record]` pairs instead; both shapes decode to
//! the same [`Entry`].
//!
//! [`RedisSink::write`]: crate::RedisSink::write

use bytes::Bytes;
use chrono::Utc;
use redstore_core::{Entry, EventTime, Record, Value};
use tracing::trace;

use crate::error::CodecError;

/// Encodes and decodes the host's buffered representation.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordCodec;

impl RecordCodec {
    /// Serializes one event as `[tag, time, record]`.
    pub fn encode(tag: &str, time: EventTime, record: &Record) -> Result<Bytes, CodecError> {
        let bytes = rmp_serde::to_vec(&(tag, time, record))?;
        Ok(Bytes::from(bytes))
    }

    /// Iterates over the entries of a chunk.
    ///
    /// Legacy entries without a parsable time get the time of this call.
    pub fn decode(chunk: &[u8]) -> Entries<'_> {
        Entries {
            remaining: chunk,
            now: Utc::now().timestamp(),
            halted: false,
        }
    }
}

/// Iterator over the entries of one chunk.
///
/// Running out of bytes ends iteration, including inside a truncated trailing
/// entry. A [`CodecError::Malformed`] item only concerns its own entry and
/// iteration continues. A [`CodecError::Decode`] item leaves the stream
/// position unknown and is always the last item.
#[derive(Debug)]
pub struct Entries<'a> {
    remaining: &'a [u8],
    now: EventTime,
    halted: bool,
}

impl Iterator for Entries<'_> {
    type Item = Result<Entry, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.halted || self.remaining.is_empty() {
            return None;
        }

        match rmp_serde::from_read::<_, Value>(&mut self.remaining) {
            Ok(message) => Some(entry_from(message, self.now)),
            Err(err) if is_end_of_stream(&err) => {
                trace!("Stop decoding at truncated trailing entry");
                self.halted = true;
                None
            }
            Err(err) => {
                trace!(remaining = self.remaining.len(), "Stop decoding corrupt chunk");
                self.halted = true;
                Some(Err(CodecError::Decode(err)))
            }
        }
    }
}

fn is_end_of_stream(err: &rmp_serde::decode::Error) -> bool {
    match err {
        rmp_serde::decode::Error::InvalidMarkerRead(io)
        | rmp_serde::decode::Error::InvalidDataRead(io) => {
            io.kind() == std::io::ErrorKind::UnexpectedEof
        }
        _ => false,
    }
}

fn entry_from(message: Value, now: EventTime) -> Result<Entry, CodecError> {
    let Value::Array(items) = message else {
        return Err(CodecError::Malformed("entry is not an array"));
    };

    match <[Value; 3]>::try_from(items) {
        Ok([Value::String(tag), time, Value::Object(record)]) => {
            let time = event_time(&time).ok_or(CodecError::Malformed("time is not an integer"))?;
            Ok(Entry::new(tag, time, record))
        }
        Ok(_) => Err(CodecError::Malformed("expected [tag, time, record]")),
        Err(items) => match <[Value; 2]>::try_from(items) {
            Ok([Value::String(identifier), Value::Object(record)]) => {
                let (tag, time) = split_identifier(&identifier, now);
                Ok(Entry::new(tag, time, record))
            }
            Ok(_) => Err(CodecError::Malformed("expected [identifier, record]")),
            Err(_) => Err(CodecError::Malformed("unexpected entry length")),
        },
    }
}

fn event_time(value: &Value) -> Option<EventTime> {
    let Value::Number(number) = value else {
        return None;
    };
    number
        .as_i64()
        .or_else(|| number.as_f64().filter(|time| time.is_finite()).map(|time| time as i64))
}

/// Splits a legacy `tag.time` identifier.
fn split_identifier(identifier: &str, now: EventTime) -> (&str, EventTime) {
    identifier
        .rsplit_once('.')
        .filter(|(_, digits)| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|(tag, digits)| Some((tag, digits.parse().ok()?)))
        .unwrap_or((identifier, now))
}
