// src/error.rs
//! Error taxonomy of the ingestion pipeline.
//!
//! Only [`ConfigError`] is fatal. Every other kind is recovered at a well-defined
//! boundary: fetch errors per subject, classification errors inside the classifier,
//! sink errors by dropping the record, store errors by counting and moving on.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration: {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("timeline request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("timeline API returned HTTP {status}")]
    Status { status: u16 },
    #[error("malformed timeline response: {0}")]
    Decode(String),
    #[error("user lookup for {0} returned no user")]
    UserNotFound(String),
}

#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("AI service is not configured")]
    Disabled,
    #[error("AI daily limit of {0} calls reached")]
    DailyLimit(u32),
    #[error("AI service request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("AI service returned HTTP {status}")]
    Status { status: u16 },
    #[error("AI service returned an unparseable result: {0}")]
    Parse(String),
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("sink rejected record with HTTP {status}")]
    Rejected { status: u16 },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed store response: {0}")]
    Decode(String),
    #[error("record {0} has no author key")]
    MissingAuthorKey(String),
}

/// Error that ends one subject's run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("fetching timeline for {subject}: {source}")]
    Fetch {
        subject: String,
        #[source]
        source: FetchError,
    },
}
