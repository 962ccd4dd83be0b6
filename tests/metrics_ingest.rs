// tests/metrics_ingest.rs
#![cfg(feature = "strict-metrics")]
use std::sync::Arc;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;
use timeline_ingest::analyze::rules::RuleTable;
use timeline_ingest::ingest::providers::FixtureTimeline;
use timeline_ingest::ingest::run_subjects;
use timeline_ingest::notify::MockSink;
use timeline_ingest::store::{MemoryStore, Subject};
use timeline_ingest::{
    ClassificationPolicy, ContentClassifier, DriverConfig, FilterPipeline, PaginationDriver,
    PersistenceGateway, RunStats,
};

#[tokio::test]
async fn metrics_exposed_after_ingest() {
    // Install a local recorder for the test
    let handle = PrometheusBuilder::new().install_recorder().expect("recorder");

    let page = std::fs::read_to_string("tests/fixtures/timeline_page_1.json").expect("fixture");
    let timeline = Arc::new(
        FixtureTimeline::new()
            .with_page_json("42", &page)
            .unwrap()
            .failing_for("7"),
    );
    let store = Arc::new(MemoryStore::new());
    let driver = PaginationDriver::new(
        timeline,
        FilterPipeline::new(store.clone(), None),
        ContentClassifier::new(
            ClassificationPolicy::Rules(RuleTable::media()),
            Arc::new(MockSink::new(200)),
        ),
        PersistenceGateway::new(store),
        DriverConfig {
            max_pages: 1,
            page_delay: Duration::ZERO,
        },
    );
    let subject = Subject {
        rest_id: "42".into(),
        screen_name: "alice".into(),
        name: None,
    };
    let broken = Subject {
        rest_id: "7".into(),
        screen_name: "bob".into(),
        name: None,
    };
    let mut stats = RunStats::default();
    run_subjects(&driver, &[subject, broken], Duration::ZERO, &mut stats).await;

    // Scrape metrics text and check series presence by substring
    let out = handle.render();
    assert!(out.contains("ingest_filtered_total"));
    assert!(out.contains("reason=\"repost\""));
    assert!(out.contains("ingest_classified_total"));
    assert!(out.contains("ingest_persisted_total"));
    assert!(out.contains("ingest_pipeline_last_run_ts"));
    // fixture failures are not HTTP responses but still count
    assert!(out.contains("ingest_fetch_errors_total 1"));
}
