// src/store/dry_run.rs
//! Read-through, write-discarding store for `--dry-run`.
//!
//! Reads (subjects, authors, existence checks) go to the configured store; tweet
//! inserts land in an in-process overlay and author updates are only logged.

use std::sync::Arc;

use async_trait::async_trait;

use super::{AuthorRow, AuthorUpdate, MemoryStore, Subject, TweetRow, TweetStore};
use crate::error::StoreError;

pub struct DryRunStore {
    upstream: Arc<dyn TweetStore>,
    overlay: MemoryStore,
}

impl DryRunStore {
    pub fn new(upstream: Arc<dyn TweetStore>) -> Self {
        Self {
            upstream,
            overlay: MemoryStore::new(),
        }
    }

    /// Rows this run would have inserted.
    pub fn discarded(&self) -> Vec<TweetRow> {
        self.overlay.tweets()
    }
}

#[async_trait]
impl TweetStore for DryRunStore {
    async fn tweet_exists(&self, tweet_id: &str) -> Result<bool, StoreError> {
        if self.overlay.tweet_exists(tweet_id).await? {
            return Ok(true);
        }
        self.upstream.tweet_exists(tweet_id).await
    }

    async fn insert_tweet(&self, row: &TweetRow) -> Result<(), StoreError> {
        tracing::debug!(target: "ingest", tweet = %row.tweet_id, "dry run: insert discarded");
        self.overlay.insert_tweet(row).await
    }

    async fn list_subjects(&self, limit: usize) -> Result<Vec<Subject>, StoreError> {
        self.upstream.list_subjects(limit).await
    }

    async fn list_authors(&self) -> Result<Vec<AuthorRow>, StoreError> {
        self.upstream.list_authors().await
    }

    async fn update_author(&self, id: i64, update: &AuthorUpdate) -> Result<(), StoreError> {
        tracing::info!(target: "ingest", id, screen_name = %update.screen_name, "dry run: author update discarded");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "dry-run"
    }
}
