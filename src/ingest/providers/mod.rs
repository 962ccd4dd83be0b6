pub mod fixture;
pub mod http_timeline;

pub use fixture::FixtureTimeline;
pub use http_timeline::HttpTimelineClient;
