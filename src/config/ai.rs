// src/config/ai.rs
use std::path::PathBuf;

use crate::error::ConfigError;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_CACHE_DIR: &str = "cache/ai";

/// Connection settings for the OpenAI-compatible content-type service.
#[derive(Debug, Clone, PartialEq)]
pub struct AiServiceConfig {
    /// Normalized: no trailing `/`, always ends with `/v1`.
    pub base_url: String,
    pub token: String,
    pub model: String,
    pub timeout_secs: u64,
    /// Cap on real calls per UTC day; cache hits do not count.
    pub daily_limit: Option<u32>,
    /// `Some("mock")` selects the deterministic analyzer.
    pub test_mode: Option<String>,
    pub cache_dir: PathBuf,
}

impl AiServiceConfig {
    /// Read `AI_SERVICE_*`, `AI_TEST_MODE` and `AI_DAILY_LIMIT` through `lookup`.
    ///
    /// Returns `Ok(None)` when neither a URL+token pair nor a test mode is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Option<Self>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let test_mode = get("AI_TEST_MODE").map(|m| m.to_ascii_lowercase());
        let url = get("AI_SERVICE_URL");
        let token = get("AI_SERVICE_TOKEN");

        if test_mode.is_none() && (url.is_none() || token.is_none()) {
            return Ok(None);
        }

        let timeout_secs = match get("AI_SERVICE_TIMEOUT") {
            None => DEFAULT_TIMEOUT_SECS,
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                key: "AI_SERVICE_TIMEOUT",
                value: v.clone(),
            })?,
        };
        let daily_limit = match get("AI_DAILY_LIMIT") {
            None => None,
            Some(v) => Some(v.parse().map_err(|_| ConfigError::Invalid {
                key: "AI_DAILY_LIMIT",
                value: v.clone(),
            })?),
        };

        Ok(Some(Self {
            base_url: url.as_deref().map(normalize_service_url).unwrap_or_default(),
            token: token.unwrap_or_default(),
            model: get("AI_SERVICE_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout_secs,
            daily_limit,
            test_mode,
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
        }))
    }
}

/// Trim trailing slashes and append `/v1` unless already present.
pub fn normalize_service_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.ends_with("/v1") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/v1")
    }
}
