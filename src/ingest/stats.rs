// src/ingest/stats.rs
//! Run-scoped counters. Owned by the caller and threaded through the pipeline.

use serde::Serialize;
use std::fmt;

use crate::ingest::filter::RejectReason;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub subjects: usize,
    pub subject_failures: usize,
    pub pages: usize,
    pub fetched: usize,
    pub rejected_promoted: usize,
    pub rejected_stale: usize,
    pub rejected_repost: usize,
    pub rejected_duplicate: usize,
    /// Survivors the normalizer could not turn into a record.
    pub unnormalizable: usize,
    pub classified: usize,
    pub ai_calls: usize,
    pub sink_forwarded: usize,
    pub sink_dropped: usize,
    pub added: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl RunStats {
    pub fn record_rejection(&mut self, reason: RejectReason) {
        match reason {
            RejectReason::Promoted => self.rejected_promoted += 1,
            RejectReason::Stale => self.rejected_stale += 1,
            RejectReason::Repost => self.rejected_repost += 1,
            RejectReason::Duplicate => self.rejected_duplicate += 1,
        }
    }

    pub fn filtered(&self) -> usize {
        self.rejected_promoted + self.rejected_stale + self.rejected_repost + self.rejected_duplicate
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run complete:")?;
        writeln!(
            f,
            "- subjects processed: {} ({} failed)",
            self.subjects, self.subject_failures
        )?;
        writeln!(f, "- pages fetched: {}", self.pages)?;
        writeln!(f, "- items fetched: {}", self.fetched)?;
        writeln!(
            f,
            "- items filtered: {} (promoted {}, stale {}, repost {}, duplicate {})",
            self.filtered(),
            self.rejected_promoted,
            self.rejected_stale,
            self.rejected_repost,
            self.rejected_duplicate
        )?;
        writeln!(f, "- items without a usable record: {}", self.unnormalizable)?;
        writeln!(
            f,
            "- records classified: {} ({} AI calls)",
            self.classified, self.ai_calls
        )?;
        writeln!(
            f,
            "- sink: {} forwarded, {} dropped",
            self.sink_forwarded, self.sink_dropped
        )?;
        writeln!(f, "- records persisted: {}", self.added)?;
        writeln!(f, "- records already stored: {}", self.skipped)?;
        write!(f, "- errors: {}", self.errors)
    }
}
