use redstore_core::PathError;
use thiserror::Error;

/// Errors raised while loading or validating a sink configuration.
///
/// All of them are fatal: the host is expected to refuse the sink instance.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid YAML or does not match the schema.
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    /// Neither a static key nor a key path is configured.
    #[error("either `key` or `key_path` must be set")]
    MissingKeySource,

    /// `strict_score` is on for a zset sink without `score_path`.
    #[error("`score_path` is required in zset mode when `strict_score` is enabled")]
    MissingScorePath,

    /// `unescape_twice` is set without a first unescape step.
    #[error("`unescape_twice` requires `unescape` or `tidy_string`")]
    UnescapeTwiceWithoutUnescape,

    /// A configured field path does not parse.
    #[error("invalid `{field}`: {source}")]
    InvalidPath {
        /// Name of the offending configuration field.
        field: &'static str,
        /// Parse failure.
        #[source]
        source: PathError,
    },

    /// `timeout` is negative, infinite or NaN.
    #[error("invalid connect timeout: {0}")]
    InvalidTimeout(f64),

    /// The store could not be built, or its feature is disabled.
    #[error("store not available: {0}")]
    StoreNotAvailable(String),
}
