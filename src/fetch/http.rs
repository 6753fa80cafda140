use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::error::ScrapeError;
use crate::fetch::PageFetcher;

/// Plain HTTP fetcher. Fast, but sees only server-rendered markup.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout_seconds: u64) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_seconds))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| ScrapeError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, ScrapeError> {
        debug!("Fetching: {}", url);

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(ScrapeError::Fetch {
                url: url.to_string(),
                reason: format!("HTTP status {}", response.status()),
            });
        }

        let html = response.text().await?;
        debug!("Fetched {} bytes from {}", html.len(), url);

        Ok(html)
    }
}
