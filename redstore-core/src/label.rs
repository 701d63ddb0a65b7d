//! Sink label type for identifying sink instances.
//!
//! `SinkLabel` is a newtype wrapper around `SmolStr` used as the store name in
//! log spans and as the `sink` label on metrics.

use smol_str::SmolStr;
use std::fmt;

/// A label identifying one configured sink instance.
///
/// # Example
/// ```
/// use redstore_core::SinkLabel;
///
/// let label = SinkLabel::new("access-log");
/// assert_eq!(label.as_str(), "access-log");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SinkLabel(SmolStr);

impl SinkLabel {
    /// Creates a new sink label.
    #[inline]
    pub fn new(s: impl Into<SmolStr>) -> Self {
        Self(s.into())
    }

    /// Creates a sink label from a static string (no allocation).
    #[inline]
    pub const fn new_static(s: &'static str) -> Self {
        Self(SmolStr::new_static(s))
    }

    /// Returns the label as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SinkLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for SinkLabel {
    #[inline]
    fn from(s: &str) -> Self {
        Self(SmolStr::new(s))
    }
}

impl From<String> for SinkLabel {
    #[inline]
    fn from(s: String) -> Self {
        Self(SmolStr::from(s))
    }
}

impl AsRef<str> for SinkLabel {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}
