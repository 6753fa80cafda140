pub mod browser;
pub mod engine;
pub mod http;
pub mod rate_limit;

pub use browser::BrowserFetcher;
pub use engine::FetchEngine;
pub use http::HttpFetcher;
pub use rate_limit::HostGate;

use async_trait::async_trait;

use crate::error::ScrapeError;

/// Capability to turn a URL into page HTML. The pipeline never talks to
/// the network directly, only through this trait.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<String, ScrapeError>;
}
