// src/notify/mod.rs
//! Secondary sink: records classified as `ai_draw` are forwarded here before
//! persistence.

pub mod http_sink;

pub use http_sink::HttpSink;

use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::SinkError;
use crate::record::TweetRecord;

/// JSON body accepted by the sink service.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SinkPayload {
    pub tweet_id: String,
    pub tweet_url: String,
    pub user: SinkUser,
    pub full_text: String,
    pub created_at: String,
    pub images: Vec<SinkImage>,
    pub videos: Vec<String>,
    pub rest_id: String,
    pub content_type: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SinkUser {
    pub rest_id: String,
    pub screen_name: String,
    pub name: Option<String>,
    pub profile_image_url: Option<String>,
    pub description: Option<String>,
    pub followers_count: Option<u64>,
    pub friends_count: Option<u64>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SinkImage {
    pub url: String,
    pub alt: Option<String>,
}

impl From<&TweetRecord> for SinkPayload {
    fn from(r: &TweetRecord) -> Self {
        Self {
            tweet_id: r.id.clone(),
            tweet_url: r.url.clone(),
            user: SinkUser {
                rest_id: r.author.rest_id.clone(),
                screen_name: r.author.screen_name.clone(),
                name: r.author.name.clone(),
                profile_image_url: r.author.avatar_url.clone(),
                description: r.author.description.clone(),
                followers_count: r.author.followers_count,
                friends_count: r.author.friends_count,
                location: r.author.location.clone(),
            },
            full_text: r.text.clone(),
            created_at: r.created_at.to_rfc3339(),
            images: r
                .media
                .images
                .iter()
                .map(|i| SinkImage {
                    url: i.url.clone(),
                    alt: i.alt_text.clone(),
                })
                .collect(),
            videos: r.media.videos.clone(),
            rest_id: r.author.rest_id.clone(),
            content_type: r.content_type.as_str().to_string(),
        }
    }
}

/// What the sink answered on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkReceipt {
    pub status: u16,
    /// Application-level `code` from the response body, when present.
    pub code: Option<i64>,
}

#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn submit(&self, record: &TweetRecord) -> Result<SinkReceipt, SinkError>;
    fn name(&self) -> &'static str;
}

/// Test helper: records submitted payloads and answers with a fixed status.
pub struct MockSink {
    status: u16,
    submitted: Mutex<Vec<SinkPayload>>,
}

impl MockSink {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn submitted(&self) -> Vec<SinkPayload> {
        self.submitted.lock().expect("mock sink poisoned").clone()
    }
}

#[async_trait]
impl RecordSink for MockSink {
    async fn submit(&self, record: &TweetRecord) -> Result<SinkReceipt, SinkError> {
        self.submitted
            .lock()
            .expect("mock sink poisoned")
            .push(SinkPayload::from(record));
        if self.status == 200 {
            Ok(SinkReceipt {
                status: 200,
                code: Some(0),
            })
        } else {
            Err(SinkError::Rejected {
                status: self.status,
            })
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
