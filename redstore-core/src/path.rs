//! Dotted field paths into nested records.
//!
//! A [`FieldPath`] is parsed once from configuration and then resolved against
//! every record. Resolution is total: a missing key or a non-mapping node on
//! the way yields `None`, never an error.
//!
//! # Examples
//!
//! ```
//! use redstore_core::FieldPath;
//! use serde_json::json;
//!
//! let path: FieldPath = "user.name".parse().unwrap();
//! let record = json!({"user": {"name": "george"}});
//!
//! assert_eq!(path.resolve(&record), Some(&json!("george")));
//! assert_eq!(path.resolve(&json!({"user": "george"})), None);
//! ```

use std::fmt;
use std::str::FromStr;

use smol_str::SmolStr;
use thiserror::Error;

use crate::Value;

const SEPARATOR: char = '.';

/// Error returned when a configured path can not be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PathError {
    /// The path contains an empty segment (`a..b`, `.a` or `a.`).
    #[error("path `{0}` contains an empty segment")]
    EmptySegment(String),
}

/// A sequence of mapping keys addressing one value inside a record.
///
/// The empty path addresses the record itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<SmolStr>,
}

impl FieldPath {
    /// The path addressing the whole record.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses a dot-separated path. The empty string is the root path.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        if path.is_empty() {
            return Ok(Self::root());
        }
        let segments = path
            .split(SEPARATOR)
            .map(|segment| {
                if segment.is_empty() {
                    Err(PathError::EmptySegment(path.to_owned()))
                } else {
                    Ok(SmolStr::new(segment))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }

    /// Returns `true` for the path addressing the whole record.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Iterates over path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(SmolStr::as_str)
    }

    /// Walks `value` one segment at a time.
    pub fn resolve<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(value, |current, segment| match current {
                Value::Object(map) => map.get(segment.as_str()),
                _ => None,
            })
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut segments = self.segments.iter();
        if let Some(first) = segments.next() {
            f.write_str(first)?;
            for segment in segments {
                write!(f, "{SEPARATOR}{segment}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_root_resolves_to_record() {
        let record = json!({"user": "george"});
        let path = FieldPath::parse("").unwrap();
        assert!(path.is_root());
        assert_eq!(path.resolve(&record), Some(&record));
    }

    #[test]
    fn test_nested_lookup() {
        let record = json!({"stat": {"attack": 7}});
        let path = FieldPath::parse("stat.attack").unwrap();
        assert_eq!(path.resolve(&record), Some(&json!(7)));
    }

    #[test]
    fn test_missing_segment_is_absent() {
        let record = json!({"stat": {"attack": 7}});
        let path = FieldPath::parse("stat.defense").unwrap();
        assert_eq!(path.resolve(&record), None);
    }

    #[test]
    fn test_scalar_intermediate_is_absent() {
        let record = json!({"user": "george"});
        let path = FieldPath::parse("user.name").unwrap();
        assert_eq!(path.resolve(&record), None);
    }

    #[test]
    fn test_sequence_intermediate_is_absent() {
        let record = json!({"tags": ["a", "b"]});
        let path = FieldPath::parse("tags.0").unwrap();
        assert_eq!(path.resolve(&record), None);
    }

    #[test]
    fn test_resolves_null_leaf() {
        let record = json!({"user": null});
        let path = FieldPath::parse("user").unwrap();
        assert_eq!(path.resolve(&record), Some(&Value::Null));
    }

    #[test]
    fn test_empty_segment_rejected() {
        for raw in ["a..b", ".a", "a."] {
            assert_eq!(
                FieldPath::parse(raw),
                Err(PathError::EmptySegment(raw.to_owned()))
            );
        }
    }

    #[test]
    fn test_display_roundtrip() {
        let path: FieldPath = "user.profile.name".parse().unwrap();
        assert_eq!(path.to_string(), "user.profile.name");
        assert_eq!(path.segments().count(), 3);
    }
}
