// tests/persistence_idempotence.rs
use std::sync::Arc;

use chrono::Utc;
use timeline_ingest::record::{Author, Flags, Media, RawShapeKind};
use timeline_ingest::store::MemoryStore;
use timeline_ingest::{ContentType, PersistOutcome, PersistenceGateway, RunStats, TweetRecord};

fn record(id: &str, author_rest_id: &str) -> TweetRecord {
    TweetRecord {
        id: id.into(),
        url: TweetRecord::status_url("alice", id),
        author: Author {
            rest_id: author_rest_id.into(),
            screen_name: "alice".into(),
            ..Author::default()
        },
        text: "hello".into(),
        created_at: Utc::now(),
        media: Media::default(),
        content_type: ContentType::Post,
        flags: Flags::default(),
        provenance: RawShapeKind::Direct,
    }
}

#[tokio::test]
async fn same_id_twice_stores_one_row() {
    let store = Arc::new(MemoryStore::new());
    let gateway = PersistenceGateway::new(store.clone());
    let mut stats = RunStats::default();

    assert_eq!(
        gateway.persist(&record("1", "42"), &mut stats).await,
        PersistOutcome::Inserted
    );
    assert_eq!(
        gateway.persist(&record("1", "42"), &mut stats).await,
        PersistOutcome::Skipped
    );

    assert_eq!(store.tweets().len(), 1);
    assert_eq!(store.insert_calls(), 1);
    assert_eq!((stats.added, stats.skipped, stats.errors), (1, 1, 0));
}

#[tokio::test]
async fn record_without_author_key_is_errored() {
    let store = Arc::new(MemoryStore::new());
    let gateway = PersistenceGateway::new(store.clone());
    let mut stats = RunStats::default();

    assert_eq!(
        gateway.persist(&record("1", ""), &mut stats).await,
        PersistOutcome::Errored
    );
    assert_eq!(store.exists_calls(), 0);
    assert_eq!(stats.errors, 1);
}

#[tokio::test]
async fn store_failures_are_counted_not_raised() {
    let store = Arc::new(MemoryStore::new().failing_inserts().failing_lookup("9"));
    let gateway = PersistenceGateway::new(store.clone());
    let mut stats = RunStats::default();

    assert_eq!(
        gateway.persist(&record("1", "42"), &mut stats).await,
        PersistOutcome::Errored
    );
    assert_eq!(
        gateway.persist(&record("9", "42"), &mut stats).await,
        PersistOutcome::Errored
    );
    assert_eq!(stats.errors, 2);
    assert_eq!(stats.added, 0);
    assert!(store.tweets().is_empty());
}

#[tokio::test]
async fn row_carries_content_type_and_author_key() {
    let store = Arc::new(MemoryStore::new());
    let gateway = PersistenceGateway::new(store.clone());
    let mut rec = record("5", "42");
    rec.content_type = ContentType::AiDraw;
    gateway.persist(&rec, &mut RunStats::default()).await;

    let row = &store.tweets()[0];
    assert_eq!(row.user_id, "42");
    assert_eq!(row.tweet_url, "https://x.com/alice/status/5");
    assert_eq!(row.content_type, ContentType::AiDraw);
}
