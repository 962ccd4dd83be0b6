// src/store/mod.rs
//! Persistent store capability: tweets keyed by id, authors keyed by row id.

pub mod dry_run;
pub mod gateway;
pub mod memory;
pub mod postgrest;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::record::{ContentType, TweetRecord};

pub use dry_run::DryRunStore;
pub use gateway::{PersistOutcome, PersistenceGateway};
pub use memory::MemoryStore;
pub use postgrest::PostgrestStore;

pub const TWEETS_TABLE: &str = "cron_twitter_tweets";
pub const USERS_TABLE: &str = "cron_twitter_users_ext";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRow {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// Row shape of the tweets collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TweetRow {
    pub tweet_id: String,
    /// Upstream rest id of the author.
    pub user_id: String,
    pub tweet_url: String,
    pub full_text: String,
    pub created_at: DateTime<Utc>,
    pub images: Vec<ImageRow>,
    pub videos: Vec<String>,
    pub content_type: ContentType,
}

impl TweetRow {
    /// Fails when the record carries no author rest id to key the row by.
    pub fn from_record(record: &TweetRecord) -> Result<Self, StoreError> {
        if record.author.rest_id.trim().is_empty() {
            return Err(StoreError::MissingAuthorKey(record.id.clone()));
        }
        Ok(Self {
            tweet_id: record.id.clone(),
            user_id: record.author.rest_id.clone(),
            tweet_url: record.url.clone(),
            full_text: record.text.clone(),
            created_at: record.created_at,
            images: record
                .media
                .images
                .iter()
                .map(|i| ImageRow {
                    url: i.url.clone(),
                    alt: i.alt_text.clone(),
                })
                .collect(),
            videos: record.media.videos.clone(),
            content_type: record.content_type,
        })
    }
}

/// Row of the users collection as read by the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRow {
    pub id: i64,
    pub rest_id: Option<String>,
    pub name: Option<String>,
    pub screen_name: Option<String>,
}

/// A subject whose timeline can be ingested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub rest_id: String,
    pub screen_name: String,
    pub name: Option<String>,
}

impl AuthorRow {
    pub fn as_subject(&self) -> Option<Subject> {
        let rest_id = self.rest_id.as_deref().filter(|s| !s.is_empty())?;
        let screen_name = self.screen_name.as_deref().filter(|s| !s.is_empty())?;
        Some(Subject {
            rest_id: rest_id.to_string(),
            screen_name: screen_name.to_string(),
            name: self.name.clone(),
        })
    }
}

/// Refreshed author profile written back on every refresh run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorUpdate {
    pub rest_id: String,
    pub name: String,
    pub avatar: String,
    pub screen_name: String,
    pub description: String,
    pub location: String,
    pub followers_count: u64,
    pub following_count: u64,
    pub tweets_count: u64,
    pub profile_url: String,
    pub raw_data: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait TweetStore: Send + Sync {
    async fn tweet_exists(&self, tweet_id: &str) -> Result<bool, StoreError>;

    async fn insert_tweet(&self, row: &TweetRow) -> Result<(), StoreError>;

    /// Authors enabled for fetching that have both a rest id and a screen name.
    async fn list_subjects(&self, limit: usize) -> Result<Vec<Subject>, StoreError>;

    /// Authors with a non-null name, for profile refresh.
    async fn list_authors(&self) -> Result<Vec<AuthorRow>, StoreError>;

    async fn update_author(&self, id: i64, update: &AuthorUpdate) -> Result<(), StoreError>;

    fn name(&self) -> &'static str;
}
