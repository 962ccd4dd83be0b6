// src/analyze/mod.rs
//! Content classification: AI-gated (incremental runs) or rule-table (history runs),
//! plus the `ai_draw` sink side effect.

pub mod ai_adapter;
pub mod rules;

use std::sync::Arc;

use metrics::counter;

use crate::ingest::stats::RunStats;
use crate::notify::RecordSink;
use crate::record::{ContentType, TweetRecord};
use ai_adapter::DynAnalyzer;
use rules::RuleTable;

/// Fewer usable image URLs or alt texts than this skips the AI call.
pub const MIN_DESCRIBED_IMAGES: usize = 2;

pub enum ClassificationPolicy {
    AiGated(DynAnalyzer),
    Rules(RuleTable),
}

/// Prompt body for the analyzer plus the counts the gate looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptBody {
    pub text: String,
    pub image_urls: usize,
    pub image_alts: usize,
}

pub fn build_prompt(record: &TweetRecord) -> PromptBody {
    let mut text = format!("\n\n{}\n\nImages:\n\n", record.text);
    let mut image_urls = 0;
    let mut image_alts = 0;
    for (n, img) in record.media.images.iter().enumerate() {
        let alt = img.alt_text.as_deref().unwrap_or("");
        text.push_str(&format!("Image {}:\nURL: {}\nAlt: {}\n", n + 1, img.url, alt));
        if img.has_url() {
            image_urls += 1;
        }
        if img.has_alt() {
            image_alts += 1;
        }
    }
    PromptBody {
        text,
        image_urls,
        image_alts,
    }
}

/// `Some(Post)` when the record is too thinly described to be worth an AI call.
pub fn heuristic_gate(prompt: &PromptBody) -> Option<ContentType> {
    if prompt.image_urls < MIN_DESCRIBED_IMAGES || prompt.image_alts < MIN_DESCRIBED_IMAGES {
        Some(ContentType::Post)
    } else {
        None
    }
}

/// What the driver should do with a classified record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Persist,
    /// The sink refused an `ai_draw` record.
    Drop,
}

pub struct ContentClassifier {
    policy: ClassificationPolicy,
    sink: Arc<dyn RecordSink>,
}

impl ContentClassifier {
    pub fn new(policy: ClassificationPolicy, sink: Arc<dyn RecordSink>) -> Self {
        Self { policy, sink }
    }

    /// Decide the content type. Never fails: analyzer errors become `Unknown`.
    pub async fn classify(&self, record: &TweetRecord, stats: &mut RunStats) -> ContentType {
        match &self.policy {
            ClassificationPolicy::Rules(table) => {
                let (ct, rule) = table.evaluate(record);
                tracing::debug!(target: "ingest", tweet = %record.id, table = table.name(), rule = rule.unwrap_or("fallback"), content_type = %ct, "rule classification");
                ct
            }
            ClassificationPolicy::AiGated(analyzer) => {
                let prompt = build_prompt(record);
                if let Some(ct) = heuristic_gate(&prompt) {
                    tracing::debug!(target: "ingest", tweet = %record.id, urls = prompt.image_urls, alts = prompt.image_alts, "below AI gate");
                    return ct;
                }
                stats.ai_calls += 1;
                counter!("ingest_ai_calls_total").increment(1);
                match analyzer.analyze(&prompt.text).await {
                    Ok(a) => {
                        let ct = ContentType::from_label(&a.content_type);
                        tracing::info!(
                            target: "ingest",
                            tweet = %record.id,
                            label = %a.content_type,
                            score = a.content_type_score,
                            reason = %a.analysis_reason,
                            "AI classification"
                        );
                        ct
                    }
                    Err(e) => {
                        tracing::warn!(target: "ingest", tweet = %record.id, provider = analyzer.provider_name(), error = %e, "AI classification failed");
                        ContentType::Unknown
                    }
                }
            }
        }
    }

    /// Classify, store the type on the record, and forward `ai_draw` records to the sink.
    pub async fn resolve(&self, record: &mut TweetRecord, stats: &mut RunStats) -> Resolution {
        let ct = self.classify(record, stats).await;
        record.content_type = ct;
        stats.classified += 1;
        counter!("ingest_classified_total", "content_type" => record.content_type.as_str())
            .increment(1);

        if record.content_type != ContentType::AiDraw {
            return Resolution::Persist;
        }
        match self.sink.submit(record).await {
            Ok(receipt) => {
                stats.sink_forwarded += 1;
                tracing::info!(target: "ingest", tweet = %record.id, code = ?receipt.code, "forwarded to sink");
                Resolution::Persist
            }
            Err(e) => {
                stats.sink_dropped += 1;
                counter!("ingest_sink_dropped_total").increment(1);
                tracing::error!(target: "ingest", tweet = %record.id, sink = self.sink.name(), error = %e, "sink refused record; dropping");
                Resolution::Drop
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Author, Flags, Image, Media, RawShapeKind};
    use chrono::Utc;

    fn record(images: &[(&str, Option<&str>)]) -> TweetRecord {
        TweetRecord {
            id: "7".into(),
            url: TweetRecord::status_url("a", "7"),
            author: Author {
                rest_id: "9".into(),
                screen_name: "a".into(),
                ..Author::default()
            },
            text: "look".into(),
            created_at: Utc::now(),
            media: Media {
                images: images
                    .iter()
                    .map(|(u, a)| Image {
                        url: u.to_string(),
                        alt_text: a.map(str::to_string),
                    })
                    .collect(),
                videos: vec![],
            },
            content_type: ContentType::Unknown,
            flags: Flags::default(),
            provenance: RawShapeKind::Direct,
        }
    }

    #[test]
    fn prompt_lists_images_in_order() {
        let p = build_prompt(&record(&[("u1", Some("a1")), ("u2", None)]));
        assert_eq!(
            p.text,
            "\n\nlook\n\nImages:\n\nImage 1:\nURL: u1\nAlt: a1\nImage 2:\nURL: u2\nAlt: \n"
        );
        assert_eq!((p.image_urls, p.image_alts), (2, 1));
    }

    #[test]
    fn gate_needs_two_urls_and_two_alts() {
        assert_eq!(heuristic_gate(&build_prompt(&record(&[]))), Some(ContentType::Post));
        assert_eq!(
            heuristic_gate(&build_prompt(&record(&[("u1", Some("a")), ("u2", Some(" "))]))),
            Some(ContentType::Post)
        );
        assert_eq!(
            heuristic_gate(&build_prompt(&record(&[("u1", Some("a")), ("u2", Some("b"))]))),
            None
        );
    }
}
