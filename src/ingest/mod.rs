// src/ingest/mod.rs
pub mod driver;
pub mod filter;
pub mod normalize;
pub mod providers;
pub mod stats;
pub mod types;

use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;

use crate::ingest::driver::PaginationDriver;
use crate::ingest::stats::RunStats;
use crate::record::TweetRecord;
use crate::store::Subject;

/// Incremental runs gate AI on described images and drop stale items;
/// full-history runs classify by rule table and keep everything regardless of age.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestMode {
    Incremental,
    FullHistory,
}

/// One-time metrics registration.
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "ingest_items_fetched_total",
            "Timeline items returned by the gateway."
        );
        describe_counter!(
            "ingest_filtered_total",
            "Items rejected by the filter chain, by reason."
        );
        describe_counter!("ingest_ai_calls_total", "Real AI classification calls.");
        describe_counter!(
            "ingest_classified_total",
            "Records classified, by content type."
        );
        describe_counter!(
            "ingest_sink_dropped_total",
            "ai_draw records dropped after a sink refusal."
        );
        describe_counter!("ingest_persisted_total", "Records inserted into the store.");
        describe_counter!("ingest_store_errors_total", "Store failures while persisting.");
        describe_counter!("ingest_fetch_errors_total", "Timeline fetch failures.");
        describe_histogram!("ingest_fetch_ms", "Timeline page fetch time in milliseconds.");
        describe_gauge!(
            "ingest_pipeline_last_run_ts",
            "Unix ts when the ingest pipeline last finished."
        );
    });
}

/// Drive every subject in order. A failing subject is logged and counted; the loop
/// continues with the next one after the fixed delay. Records a failing subject
/// inserted before the error are still returned.
pub async fn run_subjects(
    driver: &PaginationDriver,
    subjects: &[Subject],
    subject_delay: Duration,
    stats: &mut RunStats,
) -> Vec<TweetRecord> {
    ensure_metrics_described();
    let mut persisted = Vec::new();

    for (idx, subject) in subjects.iter().enumerate() {
        if idx > 0 {
            tokio::time::sleep(subject_delay).await;
        }
        stats.subjects += 1;
        tracing::info!(target: "ingest", subject = %subject.screen_name, rest_id = %subject.rest_id, "ingesting subject");

        if let Err(e) = driver.run(subject, stats, &mut persisted).await {
            stats.subject_failures += 1;
            stats.errors += 1;
            counter!("ingest_fetch_errors_total").increment(1);
            tracing::error!(target: "ingest", subject = %subject.screen_name, error = %e, "subject failed; continuing");
        }
    }

    gauge!("ingest_pipeline_last_run_ts").set(chrono::Utc::now().timestamp() as f64);
    persisted
}
