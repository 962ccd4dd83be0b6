// src/ingest/providers/fixture.rs
//! Scripted timeline for tests and offline runs: pages are served in order,
//! regardless of the cursor, and every call is recorded.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::error::FetchError;
use crate::ingest::types::{RemoteUser, TimelineApi, TimelinePage};

#[derive(Default)]
pub struct FixtureTimeline {
    pages: Mutex<HashMap<String, VecDeque<TimelinePage>>>,
    failing: Vec<String>,
    fail_when_drained: bool,
    users: HashMap<String, RemoteUser>,
    calls: Mutex<Vec<(String, Option<String>)>>,
}

impl FixtureTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, subject_id: &str, page: TimelinePage) -> Self {
        self.pages
            .lock()
            .expect("fixture poisoned")
            .entry(subject_id.to_string())
            .or_default()
            .push_back(page);
        self
    }

    /// Page from a JSON body in the gateway's wire format.
    pub fn with_page_json(self, subject_id: &str, body: &str) -> Result<Self, FetchError> {
        let value: serde_json::Value =
            serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;
        let page = super::http_timeline::parse_page(value)?;
        Ok(self.with_page(subject_id, page))
    }

    /// Every fetch for `subject_id` fails with HTTP 500.
    pub fn failing_for(mut self, subject_id: &str) -> Self {
        self.failing.push(subject_id.to_string());
        self
    }

    /// Once a subject's scripted pages run out, further fetches fail with HTTP 500
    /// instead of returning an empty page.
    pub fn failing_when_drained(mut self) -> Self {
        self.fail_when_drained = true;
        self
    }

    pub fn with_user(mut self, screen_name: &str, user: RemoteUser) -> Self {
        self.users.insert(screen_name.to_string(), user);
        self
    }

    /// `(subject_id, cursor)` per fetch, in call order.
    pub fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().expect("fixture poisoned").clone()
    }
}

#[async_trait]
impl TimelineApi for FixtureTimeline {
    async fn fetch_page(
        &self,
        subject_id: &str,
        cursor: Option<&str>,
    ) -> Result<TimelinePage, FetchError> {
        self.calls
            .lock()
            .expect("fixture poisoned")
            .push((subject_id.to_string(), cursor.map(str::to_string)));
        if self.failing.iter().any(|s| s == subject_id) {
            return Err(FetchError::Status { status: 500 });
        }
        let next = self
            .pages
            .lock()
            .expect("fixture poisoned")
            .get_mut(subject_id)
            .and_then(VecDeque::pop_front);
        match next {
            Some(page) => Ok(page),
            None if self.fail_when_drained => Err(FetchError::Status { status: 500 }),
            None => Ok(TimelinePage::default()),
        }
    }

    async fn lookup_user(&self, screen_name: &str) -> Result<RemoteUser, FetchError> {
        self.users
            .get(screen_name)
            .cloned()
            .ok_or_else(|| FetchError::UserNotFound(screen_name.to_string()))
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}
