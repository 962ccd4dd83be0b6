// src/bootstrap.rs
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::analyze::ai_adapter::{build_analyzer, DynAnalyzer};
use crate::analyze::rules::RuleTable;
use crate::analyze::{ClassificationPolicy, ContentClassifier};
use crate::config::{HistoryRules, IngestTuning, Settings};
use crate::debug::{DebugDumper, DEFAULT_DEBUG_DIR};
use crate::ingest::driver::{DriverConfig, PaginationDriver};
use crate::ingest::filter::FilterPipeline;
use crate::ingest::providers::HttpTimelineClient;
use crate::ingest::types::TimelineApi;
use crate::ingest::IngestMode;
use crate::notify::{HttpSink, RecordSink};
use crate::store::{DryRunStore, MemoryStore, PersistenceGateway, PostgrestStore, TweetStore};

/// Collaborators shared by every command.
pub struct Runtime {
    pub settings: Settings,
    pub tuning: IngestTuning,
    pub store: Arc<dyn TweetStore>,
    pub timeline: Arc<dyn TimelineApi>,
    pub sink: Arc<dyn RecordSink>,
    pub analyzer: DynAnalyzer,
}

impl Runtime {
    /// With `dry_run` the configured store is still read but never written.
    /// Without a configured store the run falls back to an empty in-memory one.
    pub fn build(settings: Settings, tuning: IngestTuning, dry_run: bool) -> Result<Self> {
        let store: Arc<dyn TweetStore> = match &settings.store {
            Some(cfg) => {
                let remote: Arc<dyn TweetStore> = Arc::new(
                    PostgrestStore::new(&cfg.url, &cfg.key).context("building store client")?,
                );
                if dry_run {
                    warn!("dry run: reading from the store, writes are discarded");
                    Arc::new(DryRunStore::new(remote))
                } else {
                    remote
                }
            }
            None => {
                warn!("no store configured: using an empty in-memory store, nothing is written");
                Arc::new(MemoryStore::new())
            }
        };
        let timeline: Arc<dyn TimelineApi> = Arc::new(
            HttpTimelineClient::new(&settings.timeline.base_url, &settings.timeline.auth_token)
                .context("building timeline client")?,
        );
        if settings.ai.is_none() {
            warn!("AI_SERVICE_URL/AI_SERVICE_TOKEN not set; gated records will be classified as unknown");
        }
        let analyzer = build_analyzer(settings.ai.as_ref());
        let sink: Arc<dyn RecordSink> = Arc::new(HttpSink::new(tuning.sink_url.clone()));

        info!(
            store = store.name(),
            timeline = timeline.name(),
            analyzer = analyzer.provider_name(),
            sink = %tuning.sink_url,
            "runtime ready"
        );
        Ok(Self {
            settings,
            tuning,
            store,
            timeline,
            sink,
            analyzer,
        })
    }

    pub fn driver(&self, mode: IngestMode) -> Result<PaginationDriver> {
        let (policy, max_age, max_pages) = match mode {
            IngestMode::Incremental => (
                ClassificationPolicy::AiGated(self.analyzer.clone()),
                Some(self.tuning.max_age_days),
                self.tuning.max_pages_incremental,
            ),
            IngestMode::FullHistory => {
                let table = match self.tuning.history_rules {
                    HistoryRules::Media => RuleTable::media(),
                    HistoryRules::Keywords => {
                        RuleTable::keywords().context("compiling keyword rules")?
                    }
                };
                (
                    ClassificationPolicy::Rules(table),
                    None,
                    self.tuning.max_pages_history,
                )
            }
        };

        let driver = PaginationDriver::new(
            self.timeline.clone(),
            FilterPipeline::new(self.store.clone(), max_age),
            ContentClassifier::new(policy, self.sink.clone()),
            PersistenceGateway::new(self.store.clone()),
            DriverConfig {
                max_pages,
                page_delay: self.tuning.page_delay(),
            },
        );
        Ok(if self.settings.debug {
            driver.with_dumper(DebugDumper::new(DEFAULT_DEBUG_DIR))
        } else {
            driver
        })
    }
}
