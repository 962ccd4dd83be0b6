// src/store/postgrest.rs
//! PostgREST (Supabase) backed store.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};

use super::{AuthorRow, AuthorUpdate, Subject, TweetRow, TweetStore, TWEETS_TABLE, USERS_TABLE};
use crate::error::StoreError;

const USER_COLUMNS: &str = "id,rest_id,name,screen_name";

#[derive(Clone)]
pub struct PostgrestStore {
    http: Client,
    base_url: String,
    key: String,
}

impl PostgrestStore {
    /// `base_url` is the project URL; `/rest/v1` is appended.
    pub fn new(base_url: &str, key: &str) -> Result<Self, StoreError> {
        let http = Client::builder()
            .user_agent(concat!("timeline-ingest/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url: format!("{}/rest/v1", base_url.trim_end_matches('/')),
            key: key.to_string(),
        })
    }

    fn table(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }

    fn authed(&self, rb: RequestBuilder) -> RequestBuilder {
        rb.header("apikey", &self.key).bearer_auth(&self.key)
    }

    async fn check(resp: Response) -> Result<Response, StoreError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn select_users(&self, filters: &[(&str, String)]) -> Result<Vec<AuthorRow>, StoreError> {
        let mut query: Vec<(&str, String)> = vec![("select", USER_COLUMNS.to_string())];
        query.extend(filters.iter().cloned());
        let resp = self
            .authed(self.http.get(self.table(USERS_TABLE)))
            .query(&query)
            .send()
            .await?;
        let resp = Self::check(resp).await?;
        resp.json::<Vec<AuthorRow>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

#[async_trait]
impl TweetStore for PostgrestStore {
    async fn tweet_exists(&self, tweet_id: &str) -> Result<bool, StoreError> {
        let resp = self
            .authed(self.http.get(self.table(TWEETS_TABLE)))
            .query(&[
                ("select", "id".to_string()),
                ("tweet_id", format!("eq.{tweet_id}")),
                ("limit", "1".to_string()),
            ])
            .send()
            .await?;
        let rows: Vec<serde_json::Value> = Self::check(resp)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(!rows.is_empty())
    }

    async fn insert_tweet(&self, row: &TweetRow) -> Result<(), StoreError> {
        let resp = self
            .authed(self.http.post(self.table(TWEETS_TABLE)))
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn list_subjects(&self, limit: usize) -> Result<Vec<Subject>, StoreError> {
        let rows = self
            .select_users(&[
                ("rest_id", "not.is.null".to_string()),
                ("screen_name", "not.is.null".to_string()),
                ("fetch_enable", "eq.true".to_string()),
                ("limit", limit.to_string()),
            ])
            .await?;
        Ok(rows.iter().filter_map(AuthorRow::as_subject).collect())
    }

    async fn list_authors(&self) -> Result<Vec<AuthorRow>, StoreError> {
        self.select_users(&[("name", "not.is.null".to_string())])
            .await
    }

    async fn update_author(&self, id: i64, update: &AuthorUpdate) -> Result<(), StoreError> {
        let resp = self
            .authed(self.http.patch(self.table(USERS_TABLE)))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=minimal")
            .json(update)
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "postgrest"
    }
}
