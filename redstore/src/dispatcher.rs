//! Per-record command selection.
//!
//! [`OperationDispatcher`] turns one [`Entry`] into the command sequence of
//! the configured [`StoreKind`] and appends it to the batch [`Pipeline`].
//! Records are dispatched strictly in decoded order, since dedup removal and
//! count trimming depend on the writes queued before them.

use std::fmt;

use redstore_backend::{Command, Pipeline};
use redstore_core::{Entry, EventTime, ValueTransformer};
use tracing::{Span, trace, warn};

use crate::error::ExtractError;
use crate::extractor::KeyValueExtractor;
use crate::policy::{BoundPolicy, Order};

/// Redis structure written by a sink instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StoreKind {
    /// Sorted set, `ZADD`.
    #[default]
    ZSet,
    /// Set, `SADD`.
    Set,
    /// List, `RPUSH` or `LPUSH`.
    List,
    /// String, `SET`.
    String,
    /// Pub/sub channel, `PUBLISH`.
    Publish,
}

impl StoreKind {
    /// Configuration name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::ZSet => "zset",
            StoreKind::Set => "set",
            StoreKind::List => "list",
            StoreKind::String => "string",
            StoreKind::Publish => "publish",
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of dispatching one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Commands were appended to the pipeline.
    Queued,
    /// The character-class filter rejected the value. Nothing was appended.
    Skipped,
    /// A recoverable error was logged. Nothing was appended.
    Dropped,
}

/// Maps records onto Redis commands for one [`StoreKind`].
#[derive(Debug, Clone)]
pub struct OperationDispatcher {
    kind: StoreKind,
    extractor: KeyValueExtractor,
    transformer: ValueTransformer,
    policy: BoundPolicy,
    prevent_duplicate: bool,
    span: Span,
}

impl OperationDispatcher {
    /// Creates a dispatcher with no transforms and no bounds.
    ///
    /// Every event the dispatcher logs is parented on `span`.
    pub fn new(kind: StoreKind, extractor: KeyValueExtractor, span: Span) -> Self {
        Self {
            kind,
            extractor,
            transformer: ValueTransformer::default(),
            policy: BoundPolicy::default(),
            prevent_duplicate: false,
            span,
        }
    }

    /// Value transforms, applied for every kind.
    pub fn transformer(mut self, transformer: ValueTransformer) -> Self {
        self.transformer = transformer;
        self
    }

    /// Expiration and size bounds.
    pub fn policy(mut self, policy: BoundPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Removes one earlier occurrence of a list value before pushing it.
    pub fn prevent_duplicate(mut self, enabled: bool) -> Self {
        self.prevent_duplicate = enabled;
        self
    }

    /// Configured store kind.
    pub fn kind(&self) -> StoreKind {
        self.kind
    }

    /// Span every event of this dispatcher is parented on.
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Appends the commands for `entry` to `pipeline`.
    ///
    /// `now` is the reference time of the sorted-set age bound. Only
    /// [fatal](ExtractError::is_fatal) errors are returned; recoverable ones
    /// are logged and reported as [`Dispatch::Dropped`]. The pipeline is left
    /// untouched unless the record is queued.
    pub fn dispatch(
        &self,
        entry: &Entry,
        now: EventTime,
        pipeline: &mut Pipeline,
    ) -> Result<Dispatch, ExtractError> {
        let triple = match self.extractor.extract(entry, self.kind == StoreKind::ZSet) {
            Ok(triple) => triple,
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                warn!(parent: &self.span, tag = entry.tag(), reason = %err, "Drop record");
                return Ok(Dispatch::Dropped);
            }
        };

        let transformed = self.transformer.apply(triple.value);
        if !transformed.accepted {
            trace!(parent: &self.span, tag = entry.tag(), key = %triple.key, "Skip filtered value");
            return Ok(Dispatch::Skipped);
        }

        let key = triple.key;
        let value = transformed.value;
        let policy = &self.policy;

        match self.kind {
            StoreKind::ZSet => {
                let score = triple.score.unwrap_or(entry.time() as f64);
                pipeline
                    .push(Command::ZAdd {
                        key: key.clone(),
                        score,
                        member: value,
                    })
                    .push_opt(policy.expire(&key))
                    .push_opt(policy.zset_age_bound(&key, now))
                    .push_opt(policy.zset_count_bound(&key));
            }
            StoreKind::Set => {
                pipeline
                    .push(Command::SAdd {
                        key: key.clone(),
                        member: value,
                    })
                    .push_opt(policy.expire(&key));
            }
            StoreKind::List => {
                if self.prevent_duplicate {
                    pipeline.push(Command::LRem {
                        key: key.clone(),
                        count: 1,
                        value: value.clone(),
                    });
                }
                let push = match policy.order {
                    Order::Asc => Command::RPush {
                        key: key.clone(),
                        value,
                    },
                    Order::Desc => Command::LPush {
                        key: key.clone(),
                        value,
                    },
                };
                pipeline
                    .push(push)
                    .push_opt(policy.expire(&key))
                    .push_opt(policy.list_count_bound(&key));
            }
            StoreKind::String => {
                pipeline
                    .push(Command::Set {
                        key: key.clone(),
                        value,
                    })
                    .push_opt(policy.expire(&key));
            }
            StoreKind::Publish => {
                pipeline.push(Command::Publish {
                    channel: key,
                    message: value,
                });
            }
        }

        Ok(Dispatch::Queued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use bytes::Bytes;
    use redstore_backend::ScoreBound;
    use redstore_core::{FieldPath, Unescape, Value};
    use serde_json::json;

    use crate::extractor::{KeySource, ScoreSource};

    fn entry(record: Value) -> Entry {
        match record {
            Value::Object(map) => Entry::new("test", 1000, map),
            other => panic!("not an object: {other}"),
        }
    }

    fn path(raw: &str) -> FieldPath {
        raw.parse().unwrap()
    }

    fn dispatcher(kind: StoreKind) -> OperationDispatcher {
        let extractor = KeyValueExtractor::new(KeySource::Path(path("user")))
            .value_path(path("value"));
        OperationDispatcher::new(kind, extractor, Span::none())
    }

    fn run(dispatcher: &OperationDispatcher, record: Value) -> (Dispatch, Vec<Command>) {
        let mut pipeline = Pipeline::new();
        let outcome = dispatcher
            .dispatch(&entry(record), 1000, &mut pipeline)
            .unwrap();
        (outcome, pipeline.into_iter().collect())
    }

    fn bytes(value: &'static str) -> Bytes {
        Bytes::from_static(value.as_bytes())
    }

    #[test]
    fn test_zset_full_sequence() {
        let dispatcher = dispatcher(StoreKind::ZSet).policy(BoundPolicy {
            key_expire: Some(3),
            value_expire: Some(60),
            value_length: Some(10),
            order: Order::Asc,
        });
        let (outcome, commands) = run(&dispatcher, json!({"user": "george", "value": "a"}));

        assert_eq!(outcome, Dispatch::Queued);
        assert_eq!(
            commands,
            vec![
                Command::ZAdd {
                    key: "george".into(),
                    score: 1000.0,
                    member: bytes("a")
                },
                Command::Expire {
                    key: "george".into(),
                    seconds: 3
                },
                Command::ZRemRangeByScore {
                    key: "george".into(),
                    min: ScoreBound::NegInfinity,
                    max: ScoreBound::Inclusive(940.0)
                },
                Command::ZRemRangeByRank {
                    key: "george".into(),
                    start: 0,
                    stop: -11
                },
            ]
        );
    }

    #[test]
    fn test_zset_score_from_path() {
        let extractor = KeyValueExtractor::new(KeySource::Path(path("user")))
            .value_path(path("value"))
            .score(ScoreSource::Path(path("result")));
        let dispatcher = OperationDispatcher::new(StoreKind::ZSet, extractor, Span::none());
        let (_, commands) = run(
            &dispatcher,
            json!({"user": "george", "value": "a", "result": 81}),
        );
        assert_eq!(
            commands,
            vec![Command::ZAdd {
                key: "george".into(),
                score: 81.0,
                member: bytes("a")
            }]
        );
    }

    #[test]
    fn test_set_and_string_expire() {
        let policy = BoundPolicy {
            key_expire: Some(3),
            value_length: Some(5),
            ..Default::default()
        };
        let (_, set) = run(
            &dispatcher(StoreKind::Set).policy(policy),
            json!({"user": "george", "value": "a"}),
        );
        assert_eq!(set.iter().map(Command::name).collect::<Vec<_>>(), ["SADD", "EXPIRE"]);

        let (_, string) = run(
            &dispatcher(StoreKind::String).policy(policy),
            json!({"user": "george", "value": "a"}),
        );
        assert_eq!(string.iter().map(Command::name).collect::<Vec<_>>(), ["SET", "EXPIRE"]);
    }

    #[test]
    fn test_list_dedup_and_trim_desc() {
        let dispatcher = dispatcher(StoreKind::List)
            .prevent_duplicate(true)
            .policy(BoundPolicy {
                value_length: Some(4),
                order: Order::Desc,
                ..Default::default()
            });
        let (_, commands) = run(&dispatcher, json!({"user": "george", "value": "a"}));
        assert_eq!(
            commands,
            vec![
                Command::LRem {
                    key: "george".into(),
                    count: 1,
                    value: bytes("a")
                },
                Command::LPush {
                    key: "george".into(),
                    value: bytes("a")
                },
                Command::LTrim {
                    key: "george".into(),
                    start: 0,
                    stop: 3
                },
            ]
        );
    }

    #[test]
    fn test_publish_ignores_bounds() {
        let dispatcher = dispatcher(StoreKind::Publish).policy(BoundPolicy {
            key_expire: Some(3),
            value_length: Some(5),
            ..Default::default()
        });
        let (_, commands) = run(&dispatcher, json!({"user": "george", "value": "a"}));
        assert_eq!(
            commands,
            vec![Command::Publish {
                channel: "george".into(),
                message: bytes("a")
            }]
        );
    }

    #[test]
    fn test_transform_applies_before_write() {
        let dispatcher = dispatcher(StoreKind::String).transformer(
            ValueTransformer::new()
                .lowercase(true)
                .unescape(Unescape::Once),
        );
        let (_, commands) = run(&dispatcher, json!({"user": "george", "value": "Hello%20World"}));
        assert_eq!(
            commands,
            vec![Command::Set {
                key: "george".into(),
                value: bytes("hello world")
            }]
        );
    }

    #[test]
    fn test_filter_rejection_skips_every_kind() {
        for kind in [
            StoreKind::ZSet,
            StoreKind::Set,
            StoreKind::List,
            StoreKind::String,
            StoreKind::Publish,
        ] {
            let dispatcher = dispatcher(kind)
                .transformer(ValueTransformer::new().only_alphanumeric(true));
            let (outcome, commands) = run(&dispatcher, json!({"user": "george", "value": "a-b"}));
            assert_eq!(outcome, Dispatch::Skipped, "{kind}");
            assert!(commands.is_empty(), "{kind}");
        }
    }

    #[test]
    fn test_invalid_score_drops_record() {
        let extractor = KeyValueExtractor::new(KeySource::Path(path("user")))
            .score(ScoreSource::Path(path("result")));
        let dispatcher = OperationDispatcher::new(StoreKind::ZSet, extractor, Span::none());
        let (outcome, commands) = run(&dispatcher, json!({"user": "george", "result": "high"}));
        assert_eq!(outcome, Dispatch::Dropped);
        assert!(commands.is_empty());
    }

    #[test]
    fn test_empty_key_is_returned() {
        let dispatcher = dispatcher(StoreKind::Set);
        let mut pipeline = Pipeline::new();
        let err = dispatcher
            .dispatch(&entry(json!({"value": "a"})), 1000, &mut pipeline)
            .unwrap_err();
        assert!(matches!(err, ExtractError::EmptyKey));
        assert!(pipeline.is_empty());
    }
}
