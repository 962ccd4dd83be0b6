// src/ingest/filter.rs
//! Ordered filter chain applied to a fetched page before normalization.
//!
//! Order: promoted → stale → repost → duplicate. The first three stages are pure
//! and run over the whole page; the duplicate stage asks the store once per
//! surviving item, in arrival order, so it sees inserts made earlier in the run.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;

use crate::ingest::normalize::{is_retweet, parse_created_at};
use crate::ingest::stats::RunStats;
use crate::ingest::types::RawTimelineItem;
use crate::store::TweetStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    Promoted,
    Stale,
    Repost,
    Duplicate,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::Promoted => "promoted",
            RejectReason::Stale => "stale",
            RejectReason::Repost => "repost",
            RejectReason::Duplicate => "duplicate",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn is_promoted(item: &RawTimelineItem) -> bool {
    item.is_promoted()
}

/// True when the item is more than `max_age_days` whole days old.
/// Items without a parseable timestamp are not considered stale.
pub fn is_stale(item: &RawTimelineItem, now: DateTime<Utc>, max_age_days: i64) -> bool {
    item.created_at_raw()
        .and_then(parse_created_at)
        .is_some_and(|created| (now - created).num_days() > max_age_days)
}

pub fn is_repost(item: &RawTimelineItem) -> bool {
    is_retweet(item)
}

pub struct FilterPipeline {
    store: Arc<dyn TweetStore>,
    /// `None` disables the age stage (full-history mode).
    max_age_days: Option<i64>,
}

impl FilterPipeline {
    pub fn new(store: Arc<dyn TweetStore>, max_age_days: Option<i64>) -> Self {
        Self {
            store,
            max_age_days,
        }
    }

    /// Verdict of the synchronous stages, first rejecting stage wins.
    pub fn sync_verdict(&self, item: &RawTimelineItem, now: DateTime<Utc>) -> Option<RejectReason> {
        if is_promoted(item) {
            return Some(RejectReason::Promoted);
        }
        if let Some(days) = self.max_age_days {
            if is_stale(item, now, days) {
                return Some(RejectReason::Stale);
            }
        }
        if is_repost(item) {
            return Some(RejectReason::Repost);
        }
        None
    }

    /// Run all stages; survivors keep their relative order.
    pub async fn apply(
        &self,
        items: Vec<RawTimelineItem>,
        now: DateTime<Utc>,
        stats: &mut RunStats,
    ) -> Vec<RawTimelineItem> {
        let mut survivors = Vec::with_capacity(items.len());
        for item in items {
            match self.sync_verdict(&item, now) {
                Some(reason) => report(&item, reason, stats),
                None => survivors.push(item),
            }
        }

        let mut kept = Vec::with_capacity(survivors.len());
        for item in survivors {
            let exists = match item.tweet_id() {
                // the normalizer rejects id-less items
                None => Ok(false),
                Some(id) => self.store.tweet_exists(id).await,
            };
            match exists {
                Ok(true) => report(&item, RejectReason::Duplicate, stats),
                Ok(false) => kept.push(item),
                Err(e) => {
                    tracing::error!(target: "ingest", tweet = %item.label(), error = %e, "duplicate check failed; keeping item");
                    stats.errors += 1;
                    kept.push(item);
                }
            }
        }

        tracing::debug!(target: "ingest", kept = kept.len(), "page filtered");
        kept
    }
}

fn report(item: &RawTimelineItem, reason: RejectReason, stats: &mut RunStats) {
    tracing::info!(target: "ingest", tweet = %item.label(), reason = %reason, "item filtered");
    counter!("ingest_filtered_total", "reason" => reason.as_str()).increment(1);
    stats.record_rejection(reason);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn item_at(created: &str) -> RawTimelineItem {
        serde_json::from_value(json!({
            "raw": {"result": {"legacy": {"idStr": "1", "fullText": "hi", "createdAt": created}}}
        }))
        .unwrap()
    }

    #[test]
    fn stale_boundary_is_whole_days() {
        let now = Utc.with_ymd_and_hms(2025, 3, 31, 12, 0, 0).unwrap();
        // exactly 30 days
        assert!(!is_stale(&item_at("Sat Mar 01 12:00:00 +0000 2025"), now, 30));
        // 30 days and 23 hours still counts as 30 whole days
        assert!(!is_stale(&item_at("Fri Feb 28 13:00:00 +0000 2025"), now, 30));
        // 31 days
        assert!(is_stale(&item_at("Fri Feb 28 12:00:00 +0000 2025"), now, 30));
    }

    #[test]
    fn missing_timestamp_is_not_stale() {
        let item: RawTimelineItem = serde_json::from_value(json!({
            "raw": {"result": {"legacy": {"idStr": "1"}}}
        }))
        .unwrap();
        assert!(!is_stale(&item, Utc::now(), 30));
    }

    #[test]
    fn promoted_wins_over_later_stages() {
        let pipeline = FilterPipeline::new(Arc::new(crate::store::MemoryStore::new()), Some(30));
        let item: RawTimelineItem = serde_json::from_value(json!({
            "promotedMetadata": {"advertiser": "x"},
            "raw": {"result": {"legacy": {"idStr": "1", "fullText": "RT @a: b"}}}
        }))
        .unwrap();
        assert_eq!(
            pipeline.sync_verdict(&item, Utc::now()),
            Some(RejectReason::Promoted)
        );
    }
}
