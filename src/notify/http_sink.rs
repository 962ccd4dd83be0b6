// src/notify/http_sink.rs
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::{RecordSink, SinkPayload, SinkReceipt};
use crate::error::SinkError;
use crate::record::TweetRecord;

/// POSTs the full record as JSON. Only HTTP 200 counts as accepted; there are no retries.
#[derive(Clone)]
pub struct HttpSink {
    url: String,
    client: Client,
    timeout: Duration,
}

impl HttpSink {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: Client::new(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(serde::Deserialize)]
struct SinkAnswer {
    code: Option<i64>,
}

#[async_trait]
impl RecordSink for HttpSink {
    async fn submit(&self, record: &TweetRecord) -> Result<SinkReceipt, SinkError> {
        let payload = SinkPayload::from(record);
        let rsp = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await?;

        let status = rsp.status().as_u16();
        let body = rsp.text().await.unwrap_or_default();
        let code = serde_json::from_str::<SinkAnswer>(&body)
            .ok()
            .and_then(|a| a.code);
        tracing::info!(target: "ingest", tweet = %record.id, status, ?code, "sink responded");

        if status != 200 {
            return Err(SinkError::Rejected { status });
        }
        Ok(SinkReceipt { status, code })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
