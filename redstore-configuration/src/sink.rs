//! Sink configuration and its conversion into a ready sink.

use std::sync::Arc;

use redstore::{
    BoundPolicy, KeySource, KeyValueExtractor, OperationDispatcher, Order, RedisSink, ScoreSource,
    StoreKind,
};
use redstore_backend::{Format, JsonFormat, MessagePackFormat, PlainFormat, Store};
use redstore_core::{FieldPath, Unescape, ValueTransformer};
use serde::{Deserialize, Serialize};
use tracing::{Span, debug, info_span};

use crate::connection::ConnectionConfig;
use crate::error::ConfigError;

/// Value encoding. Unknown names fall back to [`FormatType::Plain`].
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum FormatType {
    /// `plain`
    #[default]
    Plain,
    /// `json`
    Json,
    /// `msgpack`
    MessagePack,
}

impl From<String> for FormatType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "json" => FormatType::Json,
            "msgpack" => FormatType::MessagePack,
            _ => FormatType::Plain,
        }
    }
}

impl From<FormatType> for String {
    fn from(format: FormatType) -> Self {
        match format {
            FormatType::Plain => "plain",
            FormatType::Json => "json",
            FormatType::MessagePack => "msgpack",
        }
        .to_owned()
    }
}

impl FormatType {
    /// Encoder for this format.
    pub fn to_format(&self) -> Arc<dyn Format> {
        match self {
            FormatType::Plain => Arc::new(PlainFormat),
            FormatType::Json => Arc::new(JsonFormat),
            FormatType::MessagePack => Arc::new(MessagePackFormat),
        }
    }
}

/// Redis structure a sink writes to.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreType {
    /// Sorted set.
    #[default]
    Zset,
    /// Set.
    Set,
    /// List.
    List,
    /// String.
    String,
    /// Pub/sub channel.
    Publish,
}

impl StoreType {
    /// Matching [`StoreKind`].
    pub fn to_store_kind(&self) -> StoreKind {
        match self {
            StoreType::Zset => StoreKind::ZSet,
            StoreType::Set => StoreKind::Set,
            StoreType::List => StoreKind::List,
            StoreType::String => StoreKind::String,
            StoreType::Publish => StoreKind::Publish,
        }
    }
}

/// Direction of list pushes and of the count bound.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// `asc`
    #[default]
    Asc,
    /// `desc`
    Desc,
}

impl SortOrder {
    /// Matching [`Order`].
    pub fn to_order(&self) -> Order {
        match self {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        }
    }
}

fn disabled() -> i64 {
    -1
}

/// Configuration of one sink instance.
///
/// Field names follow the flat layout of the host's plugin configuration.
/// Numeric bounds are disabled by any non-positive value.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SinkConfig {
    /// Server address and credentials.
    #[serde(flatten)]
    pub connection: ConnectionConfig,
    /// Optional label for this sink (used in metrics/tracing).
    #[serde(default)]
    pub label: Option<String>,
    /// Value encoding.
    #[serde(default)]
    pub format_type: FormatType,
    /// Structure written per record.
    #[serde(default)]
    pub store_type: StoreType,
    /// Prepended to every key.
    #[serde(default)]
    pub key_prefix: String,
    /// Appended to every key.
    #[serde(default)]
    pub key_suffix: String,
    /// Static key. Wins over `key_path`.
    #[serde(default)]
    pub key: Option<String>,
    /// Record field holding the key.
    #[serde(default)]
    pub key_path: Option<String>,
    /// Falls back to the entry time when unset.
    #[serde(default)]
    pub score_path: Option<String>,
    /// Empty writes the whole record.
    #[serde(default)]
    pub value_path: String,
    /// `EXPIRE` seconds after every write.
    #[serde(default = "disabled")]
    pub key_expire: i64,
    /// Maximum age of sorted-set members, in score units.
    #[serde(default = "disabled")]
    pub value_expire: i64,
    /// Maximum number of sorted-set members or list items.
    #[serde(default = "disabled")]
    pub value_length: i64,
    /// Push and trim direction.
    #[serde(default)]
    pub order: SortOrder,
    /// Removes an earlier occurrence before a list push.
    #[serde(default)]
    pub prevent_duplicate: bool,
    /// Skips values with characters outside `[A-Za-z0-9 ]`.
    #[serde(default)]
    pub only_alphabet: bool,
    /// Shorthand for `lowercase` plus `unescape`.
    #[serde(default)]
    pub tidy_string: bool,
    /// Lowercases values.
    #[serde(default)]
    pub lowercase: bool,
    /// Percent-decodes values once.
    #[serde(default)]
    pub unescape: bool,
    /// Percent-decodes a second time.
    #[serde(default)]
    pub unescape_twice: bool,
    /// Refuse zset mode without `score_path`.
    #[serde(default)]
    pub strict_score: bool,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            label: None,
            format_type: FormatType::default(),
            store_type: StoreType::default(),
            key_prefix: String::new(),
            key_suffix: String::new(),
            key: None,
            key_path: None,
            score_path: None,
            value_path: String::new(),
            key_expire: disabled(),
            value_expire: disabled(),
            value_length: disabled(),
            order: SortOrder::default(),
            prevent_duplicate: false,
            only_alphabet: false,
            tidy_string: false,
            lowercase: false,
            unescape: false,
            unescape_twice: false,
            strict_score: false,
        }
    }
}

impl SinkConfig {
    /// Parses and validates a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: SinkConfig =
            serde_saphyr::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the rules serde can not express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.key.is_none() && self.key_path.is_none() {
            return Err(ConfigError::MissingKeySource);
        }
        if self.strict_score && self.store_type == StoreType::Zset && self.score_path.is_none() {
            return Err(ConfigError::MissingScorePath);
        }
        if self.unescape_twice && !(self.unescape || self.tidy_string) {
            return Err(ConfigError::UnescapeTwiceWithoutUnescape);
        }
        self.connection.connect_timeout()?;
        self.extractor()?;
        Ok(())
    }

    /// Key, value and score derivation.
    pub fn extractor(&self) -> Result<KeyValueExtractor, ConfigError> {
        let key = match (&self.key, &self.key_path) {
            (Some(key), _) => KeySource::Static(key.clone()),
            (None, Some(path)) => KeySource::Path(parse_path("key_path", path)?),
            (None, None) => return Err(ConfigError::MissingKeySource),
        };
        let score = match &self.score_path {
            Some(path) => ScoreSource::Path(parse_path("score_path", path)?),
            None => ScoreSource::EventTime,
        };

        Ok(KeyValueExtractor::new(key)
            .prefix(self.key_prefix.as_str())
            .suffix(self.key_suffix.as_str())
            .value_path(parse_path("value_path", &self.value_path)?)
            .score(score)
            .format(self.format_type.to_format()))
    }

    /// Value transforms, with `tidy_string` expanded.
    pub fn transformer(&self) -> ValueTransformer {
        let unescape = match (self.unescape || self.tidy_string, self.unescape_twice) {
            (false, _) => Unescape::Disabled,
            (true, false) => Unescape::Once,
            (true, true) => Unescape::Twice,
        };
        ValueTransformer::new()
            .lowercase(self.lowercase || self.tidy_string)
            .unescape(unescape)
            .only_alphanumeric(self.only_alphabet)
    }

    /// Bounds, with non-positive values disabled.
    pub fn policy(&self) -> BoundPolicy {
        BoundPolicy {
            key_expire: positive(self.key_expire),
            value_expire: positive(self.value_expire),
            value_length: positive(self.value_length),
            order: self.order.to_order(),
        }
    }

    /// Dispatcher logging on `span`.
    pub fn dispatcher(&self, span: Span) -> Result<OperationDispatcher, ConfigError> {
        Ok(
            OperationDispatcher::new(self.store_type.to_store_kind(), self.extractor()?, span)
                .transformer(self.transformer())
                .policy(self.policy())
                .prevent_duplicate(self.prevent_duplicate),
        )
    }

    /// Builds a sink over an already constructed store.
    pub fn build_sink<S: Store>(&self, store: S) -> Result<RedisSink<S>, ConfigError> {
        self.validate()?;
        let kind = self.store_type.to_store_kind();
        let span = info_span!(
            "redstore_sink",
            label = self.label.as_deref().unwrap_or_default(),
            store_type = %kind,
        );
        debug!(parent: &span, store = store.name(), "Build sink");
        Ok(RedisSink::new(store, self.dispatcher(span)?))
    }

    /// Builds the configured Redis store and a sink over it.
    ///
    /// The connection is established on the first write.
    pub fn into_sink(self) -> Result<RedisSink<Arc<dyn Store>>, ConfigError> {
        self.validate()?;
        let store = self.connection.clone().into_store(self.label.clone())?;
        self.build_sink(store)
    }
}

fn parse_path(field: &'static str, raw: &str) -> Result<FieldPath, ConfigError> {
    raw.parse()
        .map_err(|source| ConfigError::InvalidPath { field, source })
}

fn positive(value: i64) -> Option<u64> {
    u64::try_from(value).ok().filter(|value| *value > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SinkConfig {
        SinkConfig {
            key_path: Some("user".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_positive_bounds() {
        assert_eq!(positive(-1), None);
        assert_eq!(positive(0), None);
        assert_eq!(positive(10), Some(10));
    }

    #[test]
    fn test_tidy_string_enables_lowercase_and_unescape() {
        let config = SinkConfig {
            tidy_string: true,
            ..config()
        };
        assert_eq!(
            config.transformer(),
            ValueTransformer::new()
                .lowercase(true)
                .unescape(Unescape::Once)
        );
    }

    #[test]
    fn test_unescape_twice() {
        let config = SinkConfig {
            unescape: true,
            unescape_twice: true,
            ..config()
        };
        assert_eq!(
            config.transformer(),
            ValueTransformer::new().unescape(Unescape::Twice)
        );
    }

    #[test]
    fn test_format_type_fallback() {
        assert_eq!(FormatType::from("json".to_owned()), FormatType::Json);
        assert_eq!(FormatType::from("msgpack".to_owned()), FormatType::MessagePack);
        assert_eq!(FormatType::from("xml".to_owned()), FormatType::Plain);
    }

    #[test]
    fn test_invalid_path_names_field() {
        let config = SinkConfig {
            value_path: "stat..attack".into(),
            ..config()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidPath {
                field: "value_path",
                ..
            }
        ));
    }
}
