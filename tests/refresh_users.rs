// tests/refresh_users.rs
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use timeline_ingest::ingest::providers::FixtureTimeline;
use timeline_ingest::ingest::types::RemoteUser;
use timeline_ingest::refresh::UserRefresher;
use timeline_ingest::store::{AuthorRow, MemoryStore};

fn remote(rest_id: &str, screen_name: &str) -> RemoteUser {
    let raw = json!({
        "restId": rest_id,
        "legacy": {
            "screenName": screen_name,
            "name": "Alice A.",
            "profileImageUrlHttps": "https://pbs.twimg.com/profile.jpg",
            "followersCount": 120,
            "friendsCount": 8,
            "statusesCount": 999
        }
    });
    let mut user: RemoteUser = serde_json::from_value(raw.clone()).unwrap();
    user.raw = raw;
    user
}

#[tokio::test]
async fn refresh_updates_found_authors_and_counts_failures() {
    let store = Arc::new(
        MemoryStore::new()
            .with_author(
                AuthorRow {
                    id: 1,
                    rest_id: None,
                    name: Some("Alice".into()),
                    screen_name: Some("alice".into()),
                },
                true,
            )
            .with_author(
                AuthorRow {
                    id: 2,
                    rest_id: None,
                    name: Some("ghost".into()),
                    screen_name: None,
                },
                false,
            )
            .with_author(
                AuthorRow {
                    id: 3,
                    rest_id: None,
                    name: None,
                    screen_name: Some("nameless".into()),
                },
                true,
            ),
    );
    let timeline = Arc::new(FixtureTimeline::new().with_user("alice", remote("42", "alice")));

    let stats = UserRefresher::new(store.clone(), timeline, Duration::ZERO)
        .run()
        .await
        .unwrap();

    // row 3 has no name and is not listed
    assert_eq!(stats.authors, 2);
    assert_eq!(stats.updated, 1);
    assert_eq!(stats.errors, 1);

    let updates = store.author_updates();
    assert_eq!(updates.len(), 1);
    let (id, update) = &updates[0];
    assert_eq!(*id, 1);
    assert_eq!(update.rest_id, "42");
    assert_eq!(update.followers_count, 120);
    assert_eq!(update.following_count, 8);
    assert_eq!(update.tweets_count, 999);
    assert_eq!(update.profile_url, "https://x.com/alice");
    assert_eq!(update.raw_data["restId"], "42");
}

#[tokio::test]
async fn empty_profile_counts_as_error() {
    let store = Arc::new(MemoryStore::new().with_author(
        AuthorRow {
            id: 1,
            rest_id: None,
            name: Some("Alice".into()),
            screen_name: Some("alice".into()),
        },
        true,
    ));
    let timeline = Arc::new(FixtureTimeline::new().with_user("alice", RemoteUser::default()));

    let stats = UserRefresher::new(store.clone(), timeline, Duration::ZERO)
        .run()
        .await
        .unwrap();
    assert_eq!((stats.updated, stats.errors), (0, 1));
    assert!(store.author_updates().is_empty());
}
