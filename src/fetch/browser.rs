use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::error::ScrapeError;
use crate::fetch::PageFetcher;

/// Fetcher backed by a Browserless-style rendering service. Returns the
/// DOM after JavaScript execution, which plain HTTP cannot see.
pub struct BrowserFetcher {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl BrowserFetcher {
    pub fn new(
        base_url: &str,
        token: Option<&str>,
        timeout_seconds: u64,
    ) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| ScrapeError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
        })
    }

    fn content_endpoint(&self) -> String {
        let mut endpoint = format!("{}/content", self.base_url);
        if let Some(ref token) = self.token {
            endpoint.push_str(&format!("?token={token}"));
        }
        endpoint
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, ScrapeError> {
        debug!("Rendering via browser service: {}", url);

        let body = serde_json::json!({ "url": url });

        let resp = self
            .client
            .post(self.content_endpoint())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ScrapeError::Browser {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.text().await?)
    }
}
