// tests/ingest_config.rs
use serial_test::serial;
use std::{env, fs};
use timeline_ingest::config::tuning::load_tuning_from;
use timeline_ingest::config::{load_tuning_default, HistoryRules, IngestTuning, Settings};
use timeline_ingest::error::ConfigError;

/// Restores the touched variables on drop.
struct EnvSnapshot(Vec<(&'static str, Option<String>)>);

impl EnvSnapshot {
    fn take(keys: &[&'static str]) -> Self {
        Self(keys.iter().map(|k| (*k, env::var(k).ok())).collect())
    }
}

impl Drop for EnvSnapshot {
    fn drop(&mut self) {
        for (k, v) in &self.0 {
            match v {
                Some(v) => env::set_var(k, v),
                None => env::remove_var(k),
            }
        }
    }
}

const KEYS: &[&str] = &[
    "INGEST_CONFIG_PATH",
    "SUPABASE_URL",
    "SUPABASE_ANON_KEY",
    "SUPABASE_KEY",
    "TIMELINE_API_URL",
    "AUTH_TOKEN",
    "AI_SERVICE_URL",
    "AI_SERVICE_TOKEN",
    "AI_TEST_MODE",
    "USER_LIMIT",
    "DEBUG",
];

#[test]
fn explicit_json_file_loads() {
    let tmp = tempfile::tempdir().unwrap();
    let p = tmp.path().join("ingest.json");
    fs::write(&p, r#"{"subject_delay_ms": 5, "history_rules": "keywords"}"#).unwrap();
    let t = load_tuning_from(&p).unwrap();
    assert_eq!(t.subject_delay_ms, 5);
    assert_eq!(t.history_rules, HistoryRules::Keywords);
    assert_eq!(t.page_delay_ms, 2000);
}

#[serial]
#[test]
fn default_uses_env_then_fallbacks() {
    let _snap = EnvSnapshot::take(KEYS);
    // isolate CWD so the repo's own config/ does not interfere
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    env::remove_var("INGEST_CONFIG_PATH");

    // no files → built-in defaults
    assert_eq!(load_tuning_default().unwrap(), IngestTuning::default());

    // config/ingest.toml fallback
    fs::create_dir_all("config").unwrap();
    fs::write("config/ingest.toml", "max_pages_history = 9\n").unwrap();
    assert_eq!(load_tuning_default().unwrap().max_pages_history, 9);

    // env path wins over fallback
    let custom = tmp.path().join("custom.toml");
    fs::write(&custom, "max_age_days = 3\n").unwrap();
    env::set_var("INGEST_CONFIG_PATH", &custom);
    let t = load_tuning_default().unwrap();
    assert_eq!(t.max_age_days, 3);
    assert_eq!(t.max_pages_history, 2);

    // env path pointing nowhere is an error
    env::set_var("INGEST_CONFIG_PATH", tmp.path().join("missing.toml"));
    assert!(load_tuning_default().is_err());

    env::set_current_dir(old).unwrap();
}

#[serial]
#[test]
fn settings_from_process_env() {
    let _snap = EnvSnapshot::take(KEYS);
    for k in KEYS {
        env::remove_var(k);
    }
    env::set_var("TIMELINE_API_URL", "http://timeline.local/");
    env::set_var("AUTH_TOKEN", "tok");
    env::set_var("AI_TEST_MODE", "mock");
    env::set_var("USER_LIMIT", "7");

    let s = Settings::from_lookup(|k| env::var(k).ok(), false).unwrap();
    assert_eq!(s.user_limit, 7);
    assert_eq!(s.timeline.base_url, "http://timeline.local");
    assert_eq!(
        s.ai.as_ref().and_then(|a| a.test_mode.as_deref()),
        Some("mock")
    );

    let err = Settings::from_lookup(|k| env::var(k).ok(), true).unwrap_err();
    assert!(matches!(err, ConfigError::Missing("SUPABASE_URL")));

    env::set_var("USER_LIMIT", "many");
    let err = Settings::from_lookup(|k| env::var(k).ok(), false).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key: "USER_LIMIT", .. }));
}
