use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::{FetchConfig, FetchEngineKind};
use crate::error::ScrapeError;
use crate::fetch::rate_limit::host_of;
use crate::fetch::{BrowserFetcher, HostGate, HttpFetcher, PageFetcher};

/// Fetch frontend used by the rest of the system. Owns host spacing,
/// bounded retries and the browser-to-plain-HTTP fallback, so callers
/// only ever issue a single `fetch_page`.
pub struct FetchEngine {
    primary: Box<dyn PageFetcher>,
    fallback: Option<Box<dyn PageFetcher>>,
    gate: HostGate,
    max_retries: u32,
    retry_delay: Duration,
}

impl FetchEngine {
    pub fn from_config(config: &FetchConfig) -> Result<Self, ScrapeError> {
        let http = HttpFetcher::new(&config.user_agent, config.timeout_seconds)?;

        let (primary, fallback): (Box<dyn PageFetcher>, Option<Box<dyn PageFetcher>>) =
            match config.engine {
                FetchEngineKind::Http => (Box::new(http), None),
                FetchEngineKind::Browser => {
                    let browser = BrowserFetcher::new(
                        &config.browserless_url,
                        config.browserless_token.as_deref(),
                        config.timeout_seconds,
                    )?;
                    (Box::new(browser), Some(Box::new(http) as Box<dyn PageFetcher>))
                }
            };

        Ok(Self {
            primary,
            fallback,
            gate: HostGate::new(config.per_host_delay_ms, config.jitter_ms),
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    /// Engine without host spacing or retries, for tools that probe a
    /// single page interactively.
    pub fn one_shot(config: &FetchConfig) -> Result<Self, ScrapeError> {
        let mut relaxed = config.clone();
        relaxed.per_host_delay_ms = 0;
        relaxed.jitter_ms = 0;
        relaxed.max_retries = 0;
        Self::from_config(&relaxed)
    }

    pub async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let host = host_of(url);
        let mut attempt = 0;
        let mut last_err;

        loop {
            attempt += 1;
            self.gate.acquire(&host).await;

            match self.primary.fetch_page(url).await {
                Ok(html) => return Ok(html),
                Err(e) => {
                    if attempt > self.max_retries {
                        last_err = e;
                        break;
                    }
                    warn!(
                        "Fetch attempt {} failed for {}: {}. Retrying in {:?}",
                        attempt, url, e, self.retry_delay
                    );
                    sleep(self.retry_delay).await;
                }
            }
        }

        if let Some(ref fallback) = self.fallback {
            debug!("Primary engine gave up on {}, trying plain HTTP", url);
            self.gate.acquire(&host).await;
            match fallback.fetch_page(url).await {
                Ok(html) => return Ok(html),
                Err(e) => last_err = e,
            }
        }

        Err(last_err)
    }
}

#[async_trait]
impl PageFetcher for FetchEngine {
    async fn fetch_page(&self, url: &str) -> Result<String, ScrapeError> {
        self.fetch(url).await
    }
}
