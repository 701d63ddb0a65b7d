//! Value shaping applied before a value is written.
//!
//! Steps run in a fixed order and each one is toggled independently:
//!
//! 1. lower-casing
//! 2. percent-decoding, once or twice
//! 3. the alphanumeric filter, which decides whether the value is written at all
//!
//! Transforms work on the encoded bytes that are about to be sent. Bytes that
//! are not UTF-8 (MessagePack output, for example) pass through steps 1-2
//! untouched and never satisfy the filter.
//!
//! # Examples
//!
//! ```
//! use bytes::Bytes;
//! use redstore_core::{Unescape, ValueTransformer};
//!
//! let transformer = ValueTransformer::new()
//!     .lowercase(true)
//!     .unescape(Unescape::Once)
//!     .only_alphanumeric(true);
//!
//! let out = transformer.apply(Bytes::from_static(b"Hello%20World"));
//! assert!(out.accepted);
//! assert_eq!(out.value, Bytes::from_static(b"hello world"));
//! ```

use std::sync::LazyLock;

use bytes::Bytes;
use percent_encoding::percent_decode_str;
use regex::Regex;

static ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9 ]*$").expect("alphanumeric pattern is valid"));

/// How many percent-decoding passes to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Unescape {
    /// No decoding.
    #[default]
    Disabled,
    /// Decode once.
    Once,
    /// Decode twice, for payloads that were encoded twice upstream.
    Twice,
}

impl Unescape {
    fn passes(self) -> usize {
        match self {
            Unescape::Disabled => 0,
            Unescape::Once => 1,
            Unescape::Twice => 2,
        }
    }
}

/// Result of running a value through a [`ValueTransformer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    /// The possibly rewritten value.
    pub value: Bytes,
    /// `false` when the alphanumeric filter rejected the value. The caller
    /// must skip the record entirely.
    pub accepted: bool,
}

/// Configured chain of value transforms.
///
/// The default transformer has every step disabled and accepts everything
/// unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValueTransformer {
    lowercase: bool,
    unescape: Unescape,
    only_alphanumeric: bool,
}

impl ValueTransformer {
    /// Creates a transformer with every step disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables lower-casing.
    pub fn lowercase(mut self, enabled: bool) -> Self {
        self.lowercase = enabled;
        self
    }

    /// Sets the number of percent-decoding passes.
    pub fn unescape(mut self, unescape: Unescape) -> Self {
        self.unescape = unescape;
        self
    }

    /// Enables or disables the `^[A-Za-z0-9 ]*$` filter.
    pub fn only_alphanumeric(mut self, enabled: bool) -> Self {
        self.only_alphanumeric = enabled;
        self
    }

    /// Returns `true` when no step is enabled.
    pub fn is_noop(&self) -> bool {
        !self.lowercase && self.unescape == Unescape::Disabled && !self.only_alphanumeric
    }

    /// Runs the enabled steps over `value`.
    pub fn apply(&self, value: Bytes) -> Transformed {
        if self.is_noop() {
            return Transformed {
                value,
                accepted: true,
            };
        }

        let Ok(text) = std::str::from_utf8(&value) else {
            return Transformed {
                value,
                accepted: !self.only_alphanumeric,
            };
        };

        let mut rewritten: Option<String> = None;
        if self.lowercase {
            rewritten = Some(text.to_lowercase());
        }
        for _ in 0..self.unescape.passes() {
            let current = rewritten.as_deref().unwrap_or(text);
            rewritten = Some(unescape(current));
        }

        let accepted = !self.only_alphanumeric
            || ALPHANUMERIC.is_match(rewritten.as_deref().unwrap_or(text));

        let value = match rewritten {
            Some(text) => Bytes::from(text),
            None => value,
        };
        Transformed { value, accepted }
    }
}

/// Decodes one level of form-style percent encoding.
///
/// `+` becomes a space and `%XX` escapes are decoded; malformed escapes are
/// left as they are and invalid UTF-8 is replaced lossily.
pub fn unescape(input: &str) -> String {
    let spaced = input.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}
