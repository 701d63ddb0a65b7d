use std::sync::Arc;

use bytes::Bytes;
use pretty_assertions::assert_eq;
use redstore::backend::{Format, JsonFormat, MessagePackFormat, StoreError};
use redstore::{
    BoundPolicy, CodecError, FieldPath, KeySource, KeyValueExtractor, OperationDispatcher,
    RedisSink, ScoreSource, SinkError, StoreKind, Unescape, ValueTransformer, WriteReport,
};
use redstore_test::fixtures::{chunk, chunk_of, record};
use redstore_test::mock_store::MockStore;
use serde_json::json;
use tracing::Span;

fn path(raw: &str) -> FieldPath {
    raw.parse().unwrap()
}

fn by_user() -> KeyValueExtractor {
    KeyValueExtractor::new(KeySource::Path(path("user")))
}

fn mock_sink(dispatcher: OperationDispatcher) -> (MockStore, RedisSink<MockStore>) {
    let store = MockStore::new();
    (store.clone(), RedisSink::new(store, dispatcher))
}

fn dispatcher(kind: StoreKind, extractor: KeyValueExtractor) -> OperationDispatcher {
    OperationDispatcher::new(kind, extractor, Span::none())
}

fn text(value: &'static str) -> Bytes {
    Bytes::from_static(value.as_bytes())
}

#[tokio::test]
async fn test_string_writes_whole_record() {
    let (store, sink) = mock_sink(dispatcher(StoreKind::String, by_user()));

    let report = sink
        .write(&chunk_of([json!({"user": "george", "stat": {"attack": 7}})]))
        .await
        .unwrap();

    assert_eq!(
        report,
        WriteReport {
            written: 1,
            skipped: 0,
            dropped: 0
        }
    );
    assert_eq!(
        store.string("george"),
        Some(text(r#"{"user":"george","stat":{"attack":7}}"#))
    );
}

#[tokio::test]
async fn test_string_writes_value_path() {
    let (store, sink) = mock_sink(dispatcher(
        StoreKind::String,
        by_user().value_path(path("stat")),
    ));

    sink.write(&chunk_of([json!({"user": "george", "stat": {"attack": 7}})]))
        .await
        .unwrap();

    assert_eq!(store.string("george"), Some(text(r#"{"attack":7}"#)));
}

#[tokio::test]
async fn test_zset_score_from_record() {
    let extractor = by_user()
        .value_path(path("user"))
        .score(ScoreSource::Path(path("result")));
    let (store, sink) = mock_sink(dispatcher(StoreKind::ZSet, extractor));

    sink.write(&chunk_of([json!({"user": "george", "result": 81})]))
        .await
        .unwrap();

    assert_eq!(store.zset("george"), vec![(text("george"), 81.0)]);
}

#[tokio::test]
async fn test_zset_score_defaults_to_entry_time() {
    let (store, sink) = mock_sink(dispatcher(
        StoreKind::ZSet,
        by_user().value_path(path("user")),
    ));

    sink.write(&chunk([("app", 1293973455, json!({"user": "george"}))]))
        .await
        .unwrap();

    assert_eq!(store.zset("george"), vec![(text("george"), 1293973455.0)]);
}

#[tokio::test]
async fn test_set_collects_unique_members() {
    let (store, sink) = mock_sink(dispatcher(
        StoreKind::Set,
        by_user().value_path(path("item")),
    ));

    sink.write(&chunk_of([
        json!({"user": "george", "item": "sword"}),
        json!({"user": "george", "item": "shield"}),
        json!({"user": "george", "item": "sword"}),
    ]))
    .await
    .unwrap();

    assert_eq!(
        store.set_members("george"),
        vec![text("shield"), text("sword")]
    );
}

#[tokio::test]
async fn test_publish_sends_whole_record_without_expire() {
    let dispatcher = dispatcher(StoreKind::Publish, by_user()).policy(BoundPolicy {
        key_expire: Some(3),
        ..Default::default()
    });
    let (store, sink) = mock_sink(dispatcher);

    sink.write(&chunk_of([json!({"user": "george", "stat": {"attack": 7}})]))
        .await
        .unwrap();

    assert_eq!(
        store.published(),
        vec![(
            "george".to_string(),
            text(r#"{"user":"george","stat":{"attack":7}}"#)
        )]
    );
    assert!(!store.contains_key("george"));
    assert!(store.commands().iter().all(|command| command.name() == "PUBLISH"));
}

#[tokio::test]
async fn test_key_decoration_and_expire() {
    let extractor = by_user()
        .prefix("user:")
        .suffix(":stat")
        .value_path(path("stat.attack"));
    let dispatcher = dispatcher(StoreKind::String, extractor).policy(BoundPolicy {
        key_expire: Some(3),
        ..Default::default()
    });
    let (store, sink) = mock_sink(dispatcher);

    sink.write(&chunk_of([json!({"user": "george", "stat": {"attack": 7}})]))
        .await
        .unwrap();

    assert_eq!(store.string("user:george:stat"), Some(text("7")));
    assert_eq!(store.ttl("user:george:stat"), Some(3));
}

#[tokio::test]
async fn test_static_key_wins() {
    let extractor = KeyValueExtractor::new(KeySource::Static("events".into()));
    let (store, sink) = mock_sink(dispatcher(StoreKind::List, extractor));

    sink.write(&chunk_of([json!({"user": "george"}), json!({"user": "john"})]))
        .await
        .unwrap();

    assert_eq!(store.list("events").len(), 2);
    assert!(!store.contains_key("george"));
}

#[tokio::test]
async fn test_encodings_round_trip() {
    let formats: [Arc<dyn Format>; 2] = [Arc::new(JsonFormat), Arc::new(MessagePackFormat)];
    let record = json!({"user": "george", "stat": {"attack": 7, "tags": ["a", "b"]}});

    for format in formats {
        let extractor = by_user().value_path(path("stat")).format(format.clone());
        let (store, sink) = mock_sink(dispatcher(StoreKind::String, extractor));

        sink.write(&chunk_of([record.clone()])).await.unwrap();

        let written = store.string("george").unwrap();
        assert_eq!(format.decode(&written).unwrap(), record["stat"].clone());
    }
}

#[tokio::test]
async fn test_empty_key_aborts_whole_batch() {
    let (store, sink) = mock_sink(dispatcher(StoreKind::String, by_user()));

    let result = sink
        .write(&chunk_of([
            json!({"user": "george"}),
            json!({"name": "nobody"}),
            json!({"user": "john"}),
        ]))
        .await;

    assert!(matches!(result, Err(SinkError::EmptyKey)));
    assert_eq!(store.execute_count(), 0);
    assert!(!store.contains_key("george"));
}

#[tokio::test]
async fn test_recoverable_errors_are_counted_not_raised() {
    let extractor = by_user().score(ScoreSource::Path(path("result")));
    let (store, sink) = mock_sink(dispatcher(StoreKind::ZSet, extractor));

    let mut bytes = chunk_of([
        json!({"user": "george", "result": 81}),
        json!({"user": "john", "result": "high"}),
    ]);
    bytes.extend(rmp_serde::to_vec(&("test", 1, "not a record")).unwrap());
    bytes.extend(chunk_of([json!({"user": "paul", "result": 3})]));

    let report = sink.write(&bytes).await.unwrap();

    assert_eq!(
        report,
        WriteReport {
            written: 2,
            skipped: 0,
            dropped: 2
        }
    );
    assert_eq!(store.zset("george").len(), 1);
    assert_eq!(store.zset("paul").len(), 1);
    assert!(!store.contains_key("john"));
}

#[tokio::test]
async fn test_filter_rejections_are_never_written() {
    for kind in [
        StoreKind::ZSet,
        StoreKind::Set,
        StoreKind::List,
        StoreKind::String,
        StoreKind::Publish,
    ] {
        let dispatcher = dispatcher(kind, by_user().value_path(path("item")))
            .transformer(ValueTransformer::new().only_alphanumeric(true));
        let (store, sink) = mock_sink(dispatcher);

        let report = sink
            .write(&chunk_of([
                json!({"user": "george", "item": "magic sword 2"}),
                json!({"user": "john", "item": "<script>"}),
                json!({"user": "paul", "item": ""}),
            ]))
            .await
            .unwrap();

        assert_eq!(report.written, 2, "{kind}");
        assert_eq!(report.skipped, 1, "{kind}");
        assert!(
            store.commands().iter().all(|command| command.key() != "john"),
            "{kind}"
        );
    }
}

#[tokio::test]
async fn test_double_unescape() {
    let record = json!({"user": "george", "query": "Hello%2520World"});

    let twice = dispatcher(StoreKind::String, by_user().value_path(path("query"))).transformer(
        ValueTransformer::new()
            .lowercase(true)
            .unescape(Unescape::Twice),
    );
    let (store, sink) = mock_sink(twice);
    sink.write(&chunk_of([record.clone()])).await.unwrap();
    assert_eq!(store.string("george"), Some(text("hello world")));

    let once = dispatcher(StoreKind::String, by_user().value_path(path("query")))
        .transformer(ValueTransformer::new().unescape(Unescape::Once));
    let (store, sink) = mock_sink(once);
    sink.write(&chunk_of([record])).await.unwrap();
    assert_eq!(store.string("george"), Some(text("Hello%20World")));
}

#[tokio::test]
async fn test_store_failure_is_surfaced() {
    let store = MockStore::failing();
    let sink = RedisSink::new(store, dispatcher(StoreKind::String, by_user()));

    let result = sink.write(&chunk_of([json!({"user": "george"})])).await;

    assert!(matches!(
        result,
        Err(SinkError::Store(StoreError::ConnectionError(_)))
    ));
}

#[tokio::test]
async fn test_batch_is_one_round_trip() {
    let (store, sink) = mock_sink(dispatcher(StoreKind::List, by_user()));

    sink.write(&chunk_of([
        json!({"user": "george"}),
        json!({"user": "john"}),
        json!({"user": "george"}),
    ]))
    .await
    .unwrap();

    assert_eq!(store.execute_count(), 1);
    assert_eq!(store.list("george").len(), 2);
}

#[tokio::test]
async fn test_empty_chunk_sends_nothing_and_succeeds() {
    let (store, sink) = mock_sink(dispatcher(StoreKind::String, by_user()));

    let report = sink.write(&[]).await.unwrap();

    assert_eq!(report.total(), 0);
    assert!(store.commands().is_empty());
}

#[tokio::test]
async fn test_format_output_is_accepted_by_write() {
    let (store, sink) = mock_sink(dispatcher(StoreKind::String, by_user().value_path(path("n"))));

    let mut bytes = Vec::new();
    for (tag, user) in [("a", "george"), ("b", "john")] {
        let buffered = sink
            .format(tag, 10, &record(json!({"user": user, "n": 1})))
            .unwrap();
        bytes.extend_from_slice(&buffered);
    }
    sink.write(&bytes).await.unwrap();

    assert_eq!(store.string("george"), Some(text("1")));
    assert_eq!(store.string("john"), Some(text("1")));
}

#[tokio::test]
async fn test_corrupt_chunk_fails_batch_for_retry() {
    let (store, sink) = mock_sink(dispatcher(StoreKind::String, by_user()));

    let mut bytes = chunk_of([json!({"user": "george"})]);
    bytes.push(0xc1);
    bytes.extend(chunk_of([json!({"user": "john"}), json!({"user": "paul"})]));

    let result = sink.write(&bytes).await;

    assert!(matches!(result, Err(SinkError::Codec(CodecError::Decode(_)))));
    assert_eq!(store.execute_count(), 0);
    assert!(!store.contains_key("george"));
}

#[tokio::test]
async fn test_truncated_trailing_entry_ends_chunk() {
    let (store, sink) = mock_sink(dispatcher(StoreKind::String, by_user()));

    let mut bytes = chunk_of([json!({"user": "george"}), json!({"user": "john"})]);
    bytes.truncate(bytes.len() - 2);

    let report = sink.write(&bytes).await.unwrap();

    assert_eq!(report.total(), 1);
    assert!(store.contains_key("george"));
    assert!(!store.contains_key("john"));
}
