// src/config/tuning.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PATH: &str = "INGEST_CONFIG_PATH";

pub const DEFAULT_SINK_URL: &str = "https://py-service.flyooo.uk/social/save_from_twitter_fetch";

/// Which rule table classifies full-history runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRules {
    #[default]
    Media,
    Keywords,
}

/// Pacing and paging knobs. Every key is optional in the file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct IngestTuning {
    pub page_delay_ms: u64,
    pub subject_delay_ms: u64,
    pub refresh_delay_ms: u64,
    pub max_pages_incremental: usize,
    pub max_pages_history: usize,
    pub max_age_days: i64,
    pub sink_url: String,
    pub history_rules: HistoryRules,
}

impl Default for IngestTuning {
    fn default() -> Self {
        Self {
            page_delay_ms: 2000,
            subject_delay_ms: 2000,
            refresh_delay_ms: 1000,
            max_pages_incremental: 1,
            max_pages_history: 2,
            max_age_days: 30,
            sink_url: DEFAULT_SINK_URL.to_string(),
            history_rules: HistoryRules::Media,
        }
    }
}

impl IngestTuning {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
    pub fn subject_delay(&self) -> Duration {
        Duration::from_millis(self.subject_delay_ms)
    }
    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }
}

/// Load tunables from an explicit path. Supports TOML or JSON formats.
pub fn load_tuning_from(path: &Path) -> Result<IngestTuning> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading ingest config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_tuning(&content, ext.as_str())
        .with_context(|| format!("parsing ingest config {}", path.display()))
}

/// Load tunables using env var + fallbacks:
/// 1) $INGEST_CONFIG_PATH
/// 2) config/ingest.toml
/// 3) config/ingest.json
/// 4) built-in defaults
pub fn load_tuning_default() -> Result<IngestTuning> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_tuning_from(&pb);
        } else {
            return Err(anyhow!("INGEST_CONFIG_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/ingest.toml");
    if toml_p.exists() {
        return load_tuning_from(&toml_p);
    }
    let json_p = PathBuf::from("config/ingest.json");
    if json_p.exists() {
        return load_tuning_from(&json_p);
    }
    Ok(IngestTuning::default())
}

fn parse_tuning(s: &str, hint_ext: &str) -> Result<IngestTuning> {
    let parsed = if hint_ext == "json" || s.trim_start().starts_with('{') {
        serde_json::from_str::<IngestTuning>(s).map_err(anyhow::Error::from)
    } else {
        toml::from_str::<IngestTuning>(s).map_err(anyhow::Error::from)
    }?;
    sanitize(parsed)
}

fn sanitize(mut t: IngestTuning) -> Result<IngestTuning> {
    if t.max_pages_incremental == 0 || t.max_pages_history == 0 {
        return Err(anyhow!("max_pages_* must be at least 1"));
    }
    if t.max_age_days < 0 {
        return Err(anyhow!("max_age_days must not be negative"));
    }
    t.sink_url = t.sink_url.trim().to_string();
    if t.sink_url.is_empty() {
        t.sink_url = DEFAULT_SINK_URL.to_string();
    }
    Ok(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let t = parse_tuning("page_delay_ms = 10\nhistory_rules = \"keywords\"\n", "toml").unwrap();
        assert_eq!(t.page_delay_ms, 10);
        assert_eq!(t.history_rules, HistoryRules::Keywords);
        assert_eq!(t.max_pages_history, 2);
        assert_eq!(t.sink_url, DEFAULT_SINK_URL);
    }

    #[test]
    fn json_is_detected_from_content() {
        let t = parse_tuning(r#"{"max_age_days": 7, "sink_url": "  "}"#, "").unwrap();
        assert_eq!(t.max_age_days, 7);
        assert_eq!(t.sink_url, DEFAULT_SINK_URL);
    }

    #[test]
    fn zero_pages_rejected() {
        assert!(parse_tuning("max_pages_incremental = 0", "toml").is_err());
    }
}
