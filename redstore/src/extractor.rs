//! Key, value and score derivation.
//!
//! A [`KeyValueExtractor`] is built once from configuration and applied to
//! every record of every batch.

use std::borrow::Cow;
use std::sync::Arc;

use bytes::Bytes;
use redstore_backend::{Format, PlainFormat};
use redstore_core::{Entry, EventTime, FieldPath, Value};

use crate::error::ExtractError;

/// Where the key comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// The same key for every record.
    Static(String),
    /// A field of the record, stringified.
    Path(FieldPath),
}

/// Where the sorted-set score comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ScoreSource {
    /// A numeric field of the record.
    Path(FieldPath),
    /// The entry's ingestion time.
    #[default]
    EventTime,
}

/// Key, encoded value and optional score derived from one record.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedTriple {
    /// Final key, prefix and suffix included.
    pub key: String,
    /// Encoded value.
    pub value: Bytes,
    /// Score, only computed for sorted sets.
    pub score: Option<f64>,
}

/// Derives Redis keys, values and scores from records.
#[derive(Debug, Clone)]
pub struct KeyValueExtractor {
    key: KeySource,
    prefix: String,
    suffix: String,
    value_path: FieldPath,
    score: ScoreSource,
    format: Arc<dyn Format>,
}

impl KeyValueExtractor {
    /// Creates an extractor writing the whole record in plain format.
    pub fn new(key: KeySource) -> Self {
        Self {
            key,
            prefix: String::new(),
            suffix: String::new(),
            value_path: FieldPath::root(),
            score: ScoreSource::default(),
            format: Arc::new(PlainFormat),
        }
    }

    /// Prepended to every key.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Appended to every key.
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Path of the written value. The root path writes the whole record.
    pub fn value_path(mut self, path: FieldPath) -> Self {
        self.value_path = path;
        self
    }

    /// Score source for sorted sets.
    pub fn score(mut self, score: ScoreSource) -> Self {
        self.score = score;
        self
    }

    /// Value encoding.
    pub fn format(mut self, format: Arc<dyn Format>) -> Self {
        self.format = format;
        self
    }

    /// Derives the key of `record`.
    ///
    /// Fails with [`ExtractError::EmptyKey`] when the decorated key is empty.
    pub fn extract_key(&self, record: &Value) -> Result<String, ExtractError> {
        let key = match &self.key {
            KeySource::Static(key) => Cow::Borrowed(key.as_str()),
            KeySource::Path(path) => key_text(path.resolve(record)),
        };

        let mut decorated = String::with_capacity(self.prefix.len() + key.len() + self.suffix.len());
        decorated.push_str(&self.prefix);
        decorated.push_str(&key);
        decorated.push_str(&self.suffix);

        if decorated.is_empty() {
            return Err(ExtractError::EmptyKey);
        }
        Ok(decorated)
    }

    /// Resolves the value path and encodes the result. An absent value is
    /// encoded as `null`.
    pub fn extract_value(&self, record: &Value) -> Result<Bytes, ExtractError> {
        let value = self.value_path.resolve(record).unwrap_or(&Value::Null);
        Ok(self.format.encode(value)?)
    }

    /// Resolves the score, falling back to the ingestion time.
    pub fn extract_score(&self, record: &Value, time: EventTime) -> Result<f64, ExtractError> {
        match &self.score {
            ScoreSource::EventTime => Ok(time as f64),
            ScoreSource::Path(path) => path
                .resolve(record)
                .and_then(score_number)
                .ok_or_else(|| ExtractError::InvalidScore { path: path.clone() }),
        }
    }

    /// Derives key and value, plus the score when `with_score` is set.
    pub fn extract(&self, entry: &Entry, with_score: bool) -> Result<ExtractedTriple, ExtractError> {
        let record = entry.record();
        let key = self.extract_key(record)?;
        let value = self.extract_value(record)?;
        let score = if with_score {
            Some(self.extract_score(record, entry.time())?)
        } else {
            None
        };
        Ok(ExtractedTriple { key, value, score })
    }
}

fn key_text(value: Option<&Value>) -> Cow<'_, str> {
    match value {
        None | Some(Value::Null) => Cow::Borrowed(""),
        Some(Value::String(text)) => Cow::Borrowed(text),
        Some(Value::Bool(flag)) => Cow::Owned(flag.to_string()),
        Some(Value::Number(number)) => Cow::Owned(number.to_string()),
        Some(structured) => Cow::Owned(structured.to_string()),
    }
}

fn score_number(value: &Value) -> Option<f64> {
    let score: f64 = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse().ok()?,
        _ => return None,
    };
    (!score.is_nan()).then_some(score)
}
