// src/config/mod.rs
//! Process configuration: environment (via `dotenvy`) plus file tunables.

pub mod ai;
pub mod tuning;

pub use ai::AiServiceConfig;
pub use tuning::{load_tuning_default, HistoryRules, IngestTuning};

use crate::error::ConfigError;

pub const DEFAULT_USER_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub url: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineConfig {
    pub base_url: String,
    pub auth_token: String,
}

/// Everything read from the environment for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// `None` only when the caller did not require a store (dry runs).
    pub store: Option<StoreConfig>,
    pub timeline: TimelineConfig,
    pub ai: Option<AiServiceConfig>,
    pub debug: bool,
    pub user_limit: usize,
}

impl Settings {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env(require_store: bool) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|k| std::env::var(k).ok(), require_store)
    }

    pub fn from_lookup<F>(lookup: F, require_store: bool) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let store = match (
            get("SUPABASE_URL"),
            get("SUPABASE_ANON_KEY").or_else(|| get("SUPABASE_KEY")),
        ) {
            (Some(url), Some(key)) => Some(StoreConfig { url, key }),
            (None, _) if require_store => return Err(ConfigError::Missing("SUPABASE_URL")),
            (_, None) if require_store => {
                return Err(ConfigError::Missing("SUPABASE_ANON_KEY or SUPABASE_KEY"))
            }
            _ => None,
        };

        let timeline = TimelineConfig {
            base_url: get("TIMELINE_API_URL")
                .ok_or(ConfigError::Missing("TIMELINE_API_URL"))?
                .trim_end_matches('/')
                .to_string(),
            auth_token: get("AUTH_TOKEN").ok_or(ConfigError::Missing("AUTH_TOKEN"))?,
        };

        let user_limit = match get("USER_LIMIT") {
            None => DEFAULT_USER_LIMIT,
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                key: "USER_LIMIT",
                value: v.clone(),
            })?,
        };

        Ok(Self {
            store,
            timeline,
            ai: AiServiceConfig::from_lookup(&lookup)?,
            debug: get("DEBUG").is_some_and(|v| v.eq_ignore_ascii_case("true")),
            user_limit,
        })
    }
}
