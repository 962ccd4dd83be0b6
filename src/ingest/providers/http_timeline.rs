// src/ingest/providers/http_timeline.rs
use async_trait::async_trait;
use metrics::{counter, histogram};
use serde::Deserialize;
use std::time::{Duration, Instant};

use crate::error::FetchError;
use crate::ingest::types::{RawTimelineItem, RemoteUser, TimelineApi, TimelinePage};

/// Timeline gateway client.
///
/// * `GET {base}/users/{id}/tweets[?cursor=..]` → `{ "data": [...], "cursor": { "bottom": { "value": ".." } } }`
/// * `GET {base}/users/by-screen-name/{handle}` → `{ "data": { "user": {...} } }`
pub struct HttpTimelineClient {
    base_url: String,
    auth_token: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct PageEnvelope {
    data: Vec<serde_json::Value>,
    cursor: Option<CursorBlock>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct CursorBlock {
    bottom: Option<CursorValue>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct CursorValue {
    value: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct UserEnvelope {
    data: Option<UserData>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct UserData {
    user: Option<serde_json::Value>,
}

impl HttpTimelineClient {
    pub fn new(base_url: &str, auth_token: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("timeline-ingest/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token: auth_token.to_string(),
            client,
        })
    }

    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<serde_json::Value, FetchError> {
        let rsp = self
            .client
            .get(url)
            .bearer_auth(&self.auth_token)
            .query(query)
            .send()
            .await?;
        let status = rsp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }
        rsp.json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

/// Decode a page body. Items that do not fit the raw model are skipped, not fatal.
pub fn parse_page(body: serde_json::Value) -> Result<TimelinePage, FetchError> {
    let env: PageEnvelope =
        serde_json::from_value(body).map_err(|e| FetchError::Decode(e.to_string()))?;
    let mut items = Vec::with_capacity(env.data.len());
    for (idx, v) in env.data.into_iter().enumerate() {
        match serde_json::from_value::<RawTimelineItem>(v) {
            Ok(item) => items.push(item),
            Err(e) => tracing::warn!(target: "ingest", idx, error = %e, "skipping undecodable timeline item"),
        }
    }
    let next_cursor = env
        .cursor
        .and_then(|c| c.bottom)
        .and_then(|b| b.value)
        .filter(|v| !v.is_empty());
    Ok(TimelinePage { items, next_cursor })
}

pub fn parse_user(screen_name: &str, body: serde_json::Value) -> Result<RemoteUser, FetchError> {
    let env: UserEnvelope =
        serde_json::from_value(body).map_err(|e| FetchError::Decode(e.to_string()))?;
    let raw = env
        .data
        .and_then(|d| d.user)
        .filter(|u| !u.is_null())
        .ok_or_else(|| FetchError::UserNotFound(screen_name.to_string()))?;
    let mut user: RemoteUser =
        serde_json::from_value(raw.clone()).map_err(|e| FetchError::Decode(e.to_string()))?;
    user.raw = raw;
    Ok(user)
}

#[async_trait]
impl TimelineApi for HttpTimelineClient {
    async fn fetch_page(
        &self,
        subject_id: &str,
        cursor: Option<&str>,
    ) -> Result<TimelinePage, FetchError> {
        let t0 = Instant::now();
        let url = format!("{}/users/{}/tweets", self.base_url, subject_id);
        let query: Vec<(&str, &str)> = cursor.map(|c| vec![("cursor", c)]).unwrap_or_default();
        let body = self.get_json(&url, &query).await?;
        let page = parse_page(body)?;
        histogram!("ingest_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        counter!("ingest_items_fetched_total").increment(page.items.len() as u64);
        Ok(page)
    }

    async fn lookup_user(&self, screen_name: &str) -> Result<RemoteUser, FetchError> {
        let url = format!("{}/users/by-screen-name/{}", self.base_url, screen_name);
        let body = self.get_json(&url, &[]).await?;
        parse_user(screen_name, body)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn page_cursor_and_bad_items() {
        let page = parse_page(json!({
            "data": [
                {"raw": {"result": {"legacy": {"idStr": "1"}}}},
                {"raw": "not an object"}
            ],
            "cursor": {"bottom": {"value": "abc"}}
        }))
        .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.next_cursor.as_deref(), Some("abc"));
    }

    #[test]
    fn empty_cursor_means_last_page() {
        let page = parse_page(json!({"data": [], "cursor": {"bottom": {"value": ""}}})).unwrap();
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn missing_user_is_not_found() {
        let err = parse_user("ghost", json!({"data": {"user": null}})).unwrap_err();
        assert!(matches!(err, FetchError::UserNotFound(ref h) if h == "ghost"));
    }

    #[test]
    fn user_keeps_raw_payload() {
        let u = parse_user(
            "alice",
            json!({"data": {"user": {"restId": "42", "legacy": {"screenName": "alice"}}}}),
        )
        .unwrap();
        assert_eq!(u.rest_id.as_deref(), Some("42"));
        assert_eq!(u.raw["restId"], "42");
    }
}
