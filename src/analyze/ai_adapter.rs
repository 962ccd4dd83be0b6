//! AI adapter: content-type analysis behind a provider abstraction, plus a file
//! cache with an optional daily call limit.

use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::config::ai::AiServiceConfig;
use crate::error::ClassificationError;

/// System prompt sent with every content-type analysis.
pub const CONTENT_TYPE_PROMPT: &str = r#"You are an experienced content editor. Analyze the content type of the given social post and explain your decision.

1. Decide the content type from the post text and the attached images.
2. Content types:
    - social media post: post
    - AI image generation prompt / AI artwork: ai_draw
    - article: article
3. Consider keywords, focus and the core message of the content.

**Output format:**

Return JSON only, in this form:
{
    "content_type": "post",
    "analysis_reason": "why the content was judged to be a post",
    "content_type_score": 0.8
}"#;

/// Structured result returned by the AI service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentAnalysis {
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub analysis_reason: String,
    #[serde(default)]
    pub content_type_score: f64,
}

pub type AnalysisFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ContentAnalysis, ClassificationError>> + Send + 'a>>;

/// Trait object used by the classifier.
pub trait ContentAnalyzer: Send + Sync {
    fn analyze<'a>(&'a self, prompt: &'a str) -> AnalysisFuture<'a>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynAnalyzer = Arc<dyn ContentAnalyzer>;

/// Factory: build an analyzer from the AI service configuration.
///
/// * `AI_TEST_MODE=mock` (carried in `test_mode`) → deterministic [`FixedAnalyzer`].
/// * No service configured → [`DisabledAnalyzer`].
/// * Otherwise the chat-completions provider wrapped with caching + daily limit.
pub fn build_analyzer(config: Option<&AiServiceConfig>) -> DynAnalyzer {
    let Some(cfg) = config else {
        return Arc::new(DisabledAnalyzer);
    };
    if cfg.test_mode.as_deref() == Some("mock") {
        return Arc::new(FixedAnalyzer::replying(ContentAnalysis {
            content_type: "post".into(),
            analysis_reason: "mock".into(),
            content_type_score: 0.5,
        }));
    }
    match ChatCompletionAnalyzer::new(cfg) {
        Ok(provider) => Arc::new(CachingAnalyzer::new(
            provider,
            cfg.cache_dir.clone(),
            cfg.daily_limit,
        )),
        Err(e) => {
            tracing::warn!(error = %e, "AI client could not be built; AI classification disabled");
            Arc::new(DisabledAnalyzer)
        }
    }
}

// ------------------------------------------------------------
// Chat-completions provider
// ------------------------------------------------------------

/// OpenAI-compatible chat-completions provider.
pub struct ChatCompletionAnalyzer {
    http: reqwest::Client,
    endpoint: String,
    token: String,
    model: String,
}

impl ChatCompletionAnalyzer {
    pub fn new(cfg: &AiServiceConfig) -> Result<Self, ClassificationError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("timeline-ingest/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", cfg.base_url),
            token: cfg.token.clone(),
            model: cfg.model.clone(),
        })
    }

    async fn analyze_impl(&self, prompt: &str) -> Result<ContentAnalysis, ClassificationError> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct ResponseFormat {
            #[serde(rename = "type")]
            kind: &'static str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            response_format: ResponseFormat,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            #[serde(default)]
            content: String,
        }

        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: CONTENT_TYPE_PROMPT,
                },
                Msg {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.7,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let started = Instant::now();
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&req)
            .send()
            .await?;
        let status = resp.status();
        tracing::debug!(
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "AI service responded"
        );
        if !status.is_success() {
            return Err(ClassificationError::Status {
                status: status.as_u16(),
            });
        }

        let body: Resp = resp
            .json()
            .await
            .map_err(|e| ClassificationError::Parse(e.to_string()))?;
        let content = body
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .unwrap_or("");
        parse_analysis(content)
    }
}

impl ContentAnalyzer for ChatCompletionAnalyzer {
    fn analyze<'a>(&'a self, prompt: &'a str) -> AnalysisFuture<'a> {
        Box::pin(self.analyze_impl(prompt))
    }
    fn provider_name(&self) -> &'static str {
        "chat-completions"
    }
}

/// Parse the model's JSON answer, tolerating a fenced code block around it.
pub fn parse_analysis(content: &str) -> Result<ContentAnalysis, ClassificationError> {
    let trimmed = content.trim();
    let json = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();
    if json.is_empty() {
        return Err(ClassificationError::Parse("empty completion".into()));
    }
    serde_json::from_str(json).map_err(|e| ClassificationError::Parse(e.to_string()))
}

// ------------------------------------------------------------
// Disabled / fixed analyzers
// ------------------------------------------------------------

/// Always fails with [`ClassificationError::Disabled`]; used when AI is not configured.
pub struct DisabledAnalyzer;

impl ContentAnalyzer for DisabledAnalyzer {
    fn analyze<'a>(&'a self, _prompt: &'a str) -> AnalysisFuture<'a> {
        Box::pin(async { Err(ClassificationError::Disabled) })
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Deterministic analyzer for tests and local runs. Counts its calls.
pub struct FixedAnalyzer {
    reply: Option<ContentAnalysis>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl FixedAnalyzer {
    pub fn replying(reply: ContentAnalysis) -> Self {
        Self {
            reply: Some(reply),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with a parse error.
    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompts poisoned").clone()
    }
}

impl ContentAnalyzer for FixedAnalyzer {
    fn analyze<'a>(&'a self, prompt: &'a str) -> AnalysisFuture<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .expect("prompts poisoned")
            .push(prompt.to_string());
        let out = self
            .reply
            .clone()
            .ok_or_else(|| ClassificationError::Parse("fixed failure".into()));
        Box::pin(async move { out })
    }
    fn provider_name(&self) -> &'static str {
        "fixed"
    }
}

// ------------------------------------------------------------
// Caching wrapper (file cache + daily limit)
// ------------------------------------------------------------

/// Counter state is guarded by a `Mutex`; only real calls count against the limit.
pub struct CachingAnalyzer<A: ContentAnalyzer> {
    inner: A,
    cache_dir: PathBuf,
    daily_limit: Option<u32>,
    counter: Mutex<DailyCounter>,
}

impl<A: ContentAnalyzer> CachingAnalyzer<A> {
    pub fn new(inner: A, cache_dir: PathBuf, daily_limit: Option<u32>) -> Self {
        if let Err(e) = fs::create_dir_all(&cache_dir) {
            tracing::warn!(dir = %cache_dir.display(), error = %e, "AI cache dir unavailable");
        }
        let counter = Mutex::new(load_daily_counter(&cache_dir).unwrap_or_default());
        Self {
            inner,
            cache_dir,
            daily_limit,
            counter,
        }
    }

    async fn analyze_impl(&self, prompt: &str) -> Result<ContentAnalysis, ClassificationError> {
        let key = cache_key(prompt);
        if let Some(hit) = read_cache_file(&self.cache_dir, &key) {
            tracing::debug!(key = %key, "AI cache hit");
            return Ok(hit);
        }

        if let Some(limit) = self.daily_limit {
            let mut g = self.counter.lock().expect("poisoned counter");
            if g.is_expired() {
                g.reset_to_today();
                let _ = save_daily_counter(&self.cache_dir, &g);
            }
            if g.count >= limit {
                return Err(ClassificationError::DailyLimit(limit));
            }
        }

        let fresh = self.inner.analyze(prompt).await?;
        if let Err(e) = write_cache_file(&self.cache_dir, &key, &fresh) {
            tracing::debug!(error = %e, "AI cache write failed");
        }
        let mut g = self.counter.lock().expect("poisoned counter");
        g.count = g.count.saturating_add(1);
        let _ = save_daily_counter(&self.cache_dir, &g);
        Ok(fresh)
    }
}

impl<A: ContentAnalyzer> ContentAnalyzer for CachingAnalyzer<A> {
    fn analyze<'a>(&'a self, prompt: &'a str) -> AnalysisFuture<'a> {
        Box::pin(self.analyze_impl(prompt))
    }
    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }
}

fn cache_key(input: &str) -> String {
    let mut hasher = DefaultHasher::new();
    input.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

fn cache_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{key}.json"))
}

fn read_cache_file(dir: &Path, key: &str) -> Option<ContentAnalysis> {
    let s = fs::read_to_string(cache_path(dir, key)).ok()?;
    serde_json::from_str(&s).ok()
}

fn write_cache_file(dir: &Path, key: &str, value: &ContentAnalysis) -> io::Result<()> {
    let path = cache_path(dir, key);
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string(value).map_err(io::Error::other)?;
    let mut f = fs::File::create(&tmp)?;
    f.write_all(json.as_bytes())?;
    fs::rename(tmp, path)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DailyCounter {
    date: String,
    count: u32,
}

impl Default for DailyCounter {
    fn default() -> Self {
        Self {
            date: today(),
            count: 0,
        }
    }
}

impl DailyCounter {
    fn is_expired(&self) -> bool {
        self.date != today()
    }
    fn reset_to_today(&mut self) {
        self.date = today();
        self.count = 0;
    }
}

fn today() -> String {
    chrono::Utc::now().date_naive().to_string()
}

fn counter_path(dir: &Path) -> PathBuf {
    dir.join("daily_count.json")
}

fn load_daily_counter(dir: &Path) -> io::Result<DailyCounter> {
    let s = fs::read_to_string(counter_path(dir))?;
    serde_json::from_str(&s).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

fn save_daily_counter(dir: &Path, dc: &DailyCounter) -> io::Result<()> {
    let p = counter_path(dir);
    let tmp = p.with_extension("json.tmp");
    let s = serde_json::to_string(dc).map_err(io::Error::other)?;
    let mut f = fs::File::create(&tmp)?;
    f.write_all(s.as_bytes())?;
    fs::rename(tmp, p)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis(ct: &str) -> ContentAnalysis {
        ContentAnalysis {
            content_type: ct.into(),
            analysis_reason: "r".into(),
            content_type_score: 0.9,
        }
    }

    #[test]
    fn parses_plain_and_fenced_json() {
        let plain = r#"{"content_type":"ai_draw","analysis_reason":"x","content_type_score":0.9}"#;
        assert_eq!(parse_analysis(plain).unwrap().content_type, "ai_draw");
        let fenced = format!("```json\n{plain}\n```");
        assert_eq!(parse_analysis(&fenced).unwrap().content_type_score, 0.9);
        assert!(parse_analysis("not json").is_err());
        assert!(parse_analysis("   ").is_err());
    }

    #[test]
    fn missing_fields_default() {
        let a = parse_analysis(r#"{"content_type":"post"}"#).unwrap();
        assert_eq!(a.analysis_reason, "");
        assert_eq!(a.content_type_score, 0.0);
    }

    #[tokio::test]
    async fn cache_hit_skips_inner_call() {
        let tmp = tempfile::tempdir().unwrap();
        let client = CachingAnalyzer::new(
            FixedAnalyzer::replying(analysis("ai_draw")),
            tmp.path().to_path_buf(),
            None,
        );
        client.analyze("same prompt").await.unwrap();
        client.analyze("same prompt").await.unwrap();
        assert_eq!(client.inner.calls(), 1);
    }

    #[tokio::test]
    async fn daily_limit_blocks_real_calls_only() {
        let tmp = tempfile::tempdir().unwrap();
        let client = CachingAnalyzer::new(
            FixedAnalyzer::replying(analysis("post")),
            tmp.path().to_path_buf(),
            Some(1),
        );
        assert!(client.analyze("first").await.is_ok());
        // cached prompt still served
        assert!(client.analyze("first").await.is_ok());
        assert!(matches!(
            client.analyze("second").await,
            Err(ClassificationError::DailyLimit(1))
        ));
        assert_eq!(client.inner.calls(), 1);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let tmp = tempfile::tempdir().unwrap();
        let client = CachingAnalyzer::new(FixedAnalyzer::failing(), tmp.path().to_path_buf(), None);
        assert!(client.analyze("p").await.is_err());
        assert!(client.analyze("p").await.is_err());
        assert_eq!(client.inner.calls(), 2);
    }
}
