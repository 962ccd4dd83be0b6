// src/store/memory.rs
//! In-process store for tests and for dry runs without a configured store.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{AuthorRow, AuthorUpdate, Subject, TweetRow, TweetStore};
use crate::error::StoreError;

#[derive(Debug, Clone)]
struct AuthorEntry {
    row: AuthorRow,
    fetch_enable: bool,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tweets: Mutex<Vec<TweetRow>>,
    authors: Mutex<Vec<AuthorEntry>>,
    updates: Mutex<Vec<(i64, AuthorUpdate)>>,
    failing_ids: HashSet<String>,
    fail_inserts: bool,
    exists_calls: AtomicUsize,
    insert_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tweet(self, row: TweetRow) -> Self {
        self.tweets.lock().expect("memory store poisoned").push(row);
        self
    }

    pub fn with_author(self, row: AuthorRow, fetch_enable: bool) -> Self {
        self.authors
            .lock()
            .expect("memory store poisoned")
            .push(AuthorEntry { row, fetch_enable });
        self
    }

    /// Existence checks for `tweet_id` fail with a store error.
    pub fn failing_lookup(mut self, tweet_id: &str) -> Self {
        self.failing_ids.insert(tweet_id.to_string());
        self
    }

    /// Every insert fails with a store error.
    pub fn failing_inserts(mut self) -> Self {
        self.fail_inserts = true;
        self
    }

    pub fn tweets(&self) -> Vec<TweetRow> {
        self.tweets.lock().expect("memory store poisoned").clone()
    }

    pub fn author_updates(&self) -> Vec<(i64, AuthorUpdate)> {
        self.updates.lock().expect("memory store poisoned").clone()
    }

    pub fn exists_calls(&self) -> usize {
        self.exists_calls.load(Ordering::SeqCst)
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TweetStore for MemoryStore {
    async fn tweet_exists(&self, tweet_id: &str) -> Result<bool, StoreError> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_ids.contains(tweet_id) {
            return Err(StoreError::Status {
                status: 503,
                body: "lookup unavailable".into(),
            });
        }
        let tweets = self.tweets.lock().expect("memory store poisoned");
        Ok(tweets.iter().any(|t| t.tweet_id == tweet_id))
    }

    async fn insert_tweet(&self, row: &TweetRow) -> Result<(), StoreError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_inserts {
            return Err(StoreError::Status {
                status: 500,
                body: "insert failed".into(),
            });
        }
        let mut tweets = self.tweets.lock().expect("memory store poisoned");
        // mirrors the unique constraint on tweet_id
        if tweets.iter().any(|t| t.tweet_id == row.tweet_id) {
            return Err(StoreError::Status {
                status: 409,
                body: format!("duplicate tweet_id {}", row.tweet_id),
            });
        }
        tweets.push(row.clone());
        Ok(())
    }

    async fn list_subjects(&self, limit: usize) -> Result<Vec<Subject>, StoreError> {
        let authors = self.authors.lock().expect("memory store poisoned");
        Ok(authors
            .iter()
            .filter(|a| a.fetch_enable)
            .filter_map(|a| a.row.as_subject())
            .take(limit)
            .collect())
    }

    async fn list_authors(&self) -> Result<Vec<AuthorRow>, StoreError> {
        let authors = self.authors.lock().expect("memory store poisoned");
        Ok(authors
            .iter()
            .filter(|a| a.row.name.is_some())
            .map(|a| a.row.clone())
            .collect())
    }

    async fn update_author(&self, id: i64, update: &AuthorUpdate) -> Result<(), StoreError> {
        let mut authors = self.authors.lock().expect("memory store poisoned");
        let Some(entry) = authors.iter_mut().find(|a| a.row.id == id) else {
            return Err(StoreError::Status {
                status: 404,
                body: format!("no author row {id}"),
            });
        };
        entry.row.rest_id = Some(update.rest_id.clone());
        entry.row.name = Some(update.name.clone());
        entry.row.screen_name = Some(update.screen_name.clone());
        drop(authors);
        self.updates
            .lock()
            .expect("memory store poisoned")
            .push((id, update.clone()));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
