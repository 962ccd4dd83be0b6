// src/debug.rs
//! Raw page dumps (`DEBUG=true`) and the history-mode record export.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::types::RawTimelineItem;
use crate::record::TweetRecord;

pub const DEFAULT_DEBUG_DIR: &str = "debug";

/// Writes each fetched page to `{dir}/page-{subject}-{n}.json`.
#[derive(Debug, Clone)]
pub struct DebugDumper {
    dir: PathBuf,
}

impl DebugDumper {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn page_path(&self, subject: &str, page: usize) -> PathBuf {
        self.dir.join(format!("page-{subject}-{page}.json"))
    }

    /// Failures are logged; a dump never interrupts ingestion.
    pub fn dump_page(&self, subject: &str, page: usize, items: &[RawTimelineItem]) {
        let path = self.page_path(subject, page);
        match write_pretty(&path, items) {
            Ok(()) => tracing::debug!(path = %path.display(), items = items.len(), "page dumped"),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "page dump failed"),
        }
    }
}

/// Default export path for a history run.
pub fn default_export_path(handle: &str) -> PathBuf {
    Path::new(DEFAULT_DEBUG_DIR).join(format!("all_tweet_{handle}.json"))
}

pub fn export_records(path: &Path, records: &[TweetRecord]) -> Result<()> {
    write_pretty(path, records).with_context(|| format!("exporting records to {}", path.display()))
}

fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dumper = DebugDumper::new(tmp.path().join("nested"));
        dumper.dump_page("alice", 1, &[RawTimelineItem::default()]);
        let written = fs::read_to_string(dumper.page_path("alice", 1)).unwrap();
        assert!(written.starts_with('['));
    }

    #[test]
    fn export_path_uses_handle() {
        assert_eq!(
            default_export_path("bob"),
            PathBuf::from("debug/all_tweet_bob.json")
        );
    }
}
