// src/store/gateway.rs
//! Idempotent check-then-insert of canonical records.
//!
//! The existence check and the insert are separate round-trips with no
//! transaction. Two ingesters running for the same subject can both see
//! "absent" and double insert; a single sequential run cannot.

use std::sync::Arc;

use metrics::counter;

use super::{TweetRow, TweetStore};
use crate::ingest::stats::RunStats;
use crate::record::TweetRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    Inserted,
    /// Already stored; nothing written.
    Skipped,
    /// Store failure or unkeyable record; logged and counted.
    Errored,
}

#[derive(Clone)]
pub struct PersistenceGateway {
    store: Arc<dyn TweetStore>,
}

impl PersistenceGateway {
    pub fn new(store: Arc<dyn TweetStore>) -> Self {
        Self { store }
    }

    /// Never fails: every outcome lands in exactly one of `added`/`skipped`/`errors`.
    pub async fn persist(&self, record: &TweetRecord, stats: &mut RunStats) -> PersistOutcome {
        let outcome = self.persist_inner(record).await;
        match outcome {
            PersistOutcome::Inserted => {
                stats.added += 1;
                counter!("ingest_persisted_total").increment(1);
                tracing::info!(target: "ingest", url = %record.url, content_type = %record.content_type, "tweet stored");
            }
            PersistOutcome::Skipped => {
                stats.skipped += 1;
                tracing::debug!(target: "ingest", tweet = %record.id, "tweet already stored");
            }
            PersistOutcome::Errored => {
                stats.errors += 1;
                counter!("ingest_store_errors_total").increment(1);
            }
        }
        outcome
    }

    async fn persist_inner(&self, record: &TweetRecord) -> PersistOutcome {
        let row = match TweetRow::from_record(record) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(target: "ingest", url = %record.url, error = %e, "cannot key tweet row");
                return PersistOutcome::Errored;
            }
        };

        match self.store.tweet_exists(&row.tweet_id).await {
            Ok(true) => return PersistOutcome::Skipped,
            Ok(false) => {}
            Err(e) => {
                tracing::error!(target: "ingest", tweet = %row.tweet_id, error = %e, "tweet lookup failed");
                return PersistOutcome::Errored;
            }
        }

        match self.store.insert_tweet(&row).await {
            Ok(()) => PersistOutcome::Inserted,
            Err(e) => {
                tracing::error!(target: "ingest", tweet = %row.tweet_id, error = %e, "tweet insert failed");
                PersistOutcome::Errored
            }
        }
    }
}
