// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod analyze;
pub mod bootstrap;
pub mod config;
pub mod debug;
pub mod error;
pub mod ingest;
pub mod notify;
pub mod record;
pub mod refresh;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::analyze::ai_adapter;
pub use crate::analyze::{ClassificationPolicy, ContentClassifier, Resolution};
pub use crate::ingest::driver::{DriverConfig, PaginationDriver};
pub use crate::ingest::filter::FilterPipeline;
pub use crate::ingest::normalize::SchemaNormalizer;
pub use crate::ingest::stats::RunStats;
pub use crate::record::{ContentType, TweetRecord};
pub use crate::store::{PersistOutcome, PersistenceGateway};
