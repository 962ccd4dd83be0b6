// src/ingest/driver.rs
//! Per-subject pagination as an explicit state machine:
//! `Fetching → Filtering → Classifying → Persisting → (Advance | Done)`.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::analyze::{ContentClassifier, Resolution};
use crate::debug::DebugDumper;
use crate::error::IngestError;
use crate::ingest::filter::FilterPipeline;
use crate::ingest::normalize::SchemaNormalizer;
use crate::ingest::stats::RunStats;
use crate::ingest::types::{RawTimelineItem, TimelineApi, TimelinePage};
use crate::record::TweetRecord;
use crate::store::{PersistOutcome, PersistenceGateway, Subject};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    pub max_pages: usize,
    pub page_delay: Duration,
}

#[derive(Debug)]
enum DriverState {
    Fetching {
        cursor: Option<String>,
    },
    Filtering {
        page: TimelinePage,
    },
    Classifying {
        queue: VecDeque<RawTimelineItem>,
        next_cursor: Option<String>,
    },
    Persisting {
        record: TweetRecord,
        queue: VecDeque<RawTimelineItem>,
        next_cursor: Option<String>,
    },
    Advance {
        next_cursor: Option<String>,
    },
    Done,
}

pub struct PaginationDriver {
    timeline: Arc<dyn TimelineApi>,
    filter: FilterPipeline,
    normalizer: SchemaNormalizer,
    classifier: ContentClassifier,
    gateway: PersistenceGateway,
    config: DriverConfig,
    dumper: Option<DebugDumper>,
    clock: fn() -> DateTime<Utc>,
}

impl PaginationDriver {
    pub fn new(
        timeline: Arc<dyn TimelineApi>,
        filter: FilterPipeline,
        classifier: ContentClassifier,
        gateway: PersistenceGateway,
        config: DriverConfig,
    ) -> Self {
        Self {
            timeline,
            filter,
            normalizer: SchemaNormalizer::new(),
            classifier,
            gateway,
            config,
            dumper: None,
            clock: Utc::now,
        }
    }

    pub fn with_dumper(mut self, dumper: DebugDumper) -> Self {
        self.dumper = Some(dumper);
        self
    }

    /// Replace the wall clock used by the age filter.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Drive one subject to `Done`, appending every inserted record to `persisted`.
    /// Records from pages before a failed fetch stay in `persisted`.
    /// Returns how many records this call inserted.
    pub async fn run(
        &self,
        subject: &Subject,
        stats: &mut RunStats,
        persisted: &mut Vec<TweetRecord>,
    ) -> Result<usize, IngestError> {
        let start = persisted.len();
        let mut pages = 0usize;
        let mut state = DriverState::Fetching { cursor: None };

        loop {
            state = match state {
                DriverState::Fetching { cursor } => {
                    let page = self
                        .timeline
                        .fetch_page(&subject.rest_id, cursor.as_deref())
                        .await
                        .map_err(|source| IngestError::Fetch {
                            subject: subject.screen_name.clone(),
                            source,
                        })?;
                    pages += 1;
                    stats.pages += 1;
                    stats.fetched += page.items.len();
                    tracing::info!(
                        target: "ingest",
                        subject = %subject.screen_name,
                        page = pages,
                        items = page.items.len(),
                        has_next = page.next_cursor.is_some(),
                        "page fetched"
                    );
                    if let Some(d) = &self.dumper {
                        d.dump_page(&subject.screen_name, pages, &page.items);
                    }
                    if page.items.is_empty() {
                        DriverState::Done
                    } else {
                        DriverState::Filtering { page }
                    }
                }
                DriverState::Filtering { page } => {
                    let survivors = self.filter.apply(page.items, (self.clock)(), stats).await;
                    DriverState::Classifying {
                        queue: survivors.into(),
                        next_cursor: page.next_cursor,
                    }
                }
                DriverState::Classifying {
                    mut queue,
                    next_cursor,
                } => match queue.pop_front() {
                    None => DriverState::Advance { next_cursor },
                    Some(item) => {
                        match self.normalizer.normalize(&item, Some(subject.rest_id.as_str())) {
                            Err(reason) => {
                                stats.unnormalizable += 1;
                                tracing::warn!(target: "ingest", tweet = %item.label(), %reason, "item not normalizable");
                                DriverState::Classifying { queue, next_cursor }
                            }
                            Ok(mut record) => match self.classifier.resolve(&mut record, stats).await {
                                Resolution::Persist => DriverState::Persisting {
                                    record,
                                    queue,
                                    next_cursor,
                                },
                                Resolution::Drop => DriverState::Classifying { queue, next_cursor },
                            },
                        }
                    }
                },
                DriverState::Persisting {
                    record,
                    queue,
                    next_cursor,
                } => {
                    if self.gateway.persist(&record, stats).await == PersistOutcome::Inserted {
                        persisted.push(record);
                    }
                    DriverState::Classifying { queue, next_cursor }
                }
                DriverState::Advance { next_cursor } => match next_cursor {
                    Some(cursor) if pages < self.config.max_pages => {
                        tokio::time::sleep(self.config.page_delay).await;
                        DriverState::Fetching {
                            cursor: Some(cursor),
                        }
                    }
                    _ => DriverState::Done,
                },
                DriverState::Done => break,
            };
        }

        tracing::info!(
            target: "ingest",
            subject = %subject.screen_name,
            pages,
            persisted = persisted.len() - start,
            "subject done"
        );
        Ok(persisted.len() - start)
    }
}
