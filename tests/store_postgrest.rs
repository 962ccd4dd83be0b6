// tests/store_postgrest.rs
use chrono::Utc;
use serde_json::json;
use timeline_ingest::error::StoreError;
use timeline_ingest::store::{PostgrestStore, TweetRow, TweetStore};
use timeline_ingest::ContentType;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn row() -> TweetRow {
    TweetRow {
        tweet_id: "100".into(),
        user_id: "42".into(),
        tweet_url: "https://x.com/alice/status/100".into(),
        full_text: "hi".into(),
        created_at: Utc::now(),
        images: vec![],
        videos: vec![],
        content_type: ContentType::Post,
    }
}

#[tokio::test]
async fn existence_check_filters_by_tweet_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/cron_twitter_tweets"))
        .and(query_param("tweet_id", "eq.100"))
        .and(header("apikey", "anon"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/cron_twitter_tweets"))
        .and(query_param("tweet_id", "eq.200"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let store = PostgrestStore::new(&format!("{}/", server.uri()), "anon").unwrap();
    assert!(store.tweet_exists("100").await.unwrap());
    assert!(!store.tweet_exists("200").await.unwrap());
}

#[tokio::test]
async fn insert_posts_the_row() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/cron_twitter_tweets"))
        .and(header("authorization", "Bearer anon"))
        .and(body_partial_json(json!({"tweet_id": "100", "user_id": "42", "content_type": "post"})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let store = PostgrestStore::new(&server.uri(), "anon").unwrap();
    store.insert_tweet(&row()).await.unwrap();
}

#[tokio::test]
async fn http_errors_surface_as_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/cron_twitter_tweets"))
        .respond_with(ResponseTemplate::new(409).set_body_string("duplicate key"))
        .mount(&server)
        .await;

    let store = PostgrestStore::new(&server.uri(), "anon").unwrap();
    let err = store.insert_tweet(&row()).await.unwrap_err();
    assert!(matches!(err, StoreError::Status { status: 409, ref body } if body == "duplicate key"));
}

#[tokio::test]
async fn subjects_skip_rows_without_keys() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/cron_twitter_users_ext"))
        .and(query_param("fetch_enable", "eq.true"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "rest_id": "42", "name": "Alice", "screen_name": "alice"},
            {"id": 2, "rest_id": "", "name": "Bob", "screen_name": "bob"}
        ])))
        .mount(&server)
        .await;

    let store = PostgrestStore::new(&server.uri(), "anon").unwrap();
    let subjects = store.list_subjects(5).await.unwrap();
    assert_eq!(subjects.len(), 1);
    assert_eq!(subjects[0].rest_id, "42");
}
