use serde::{Deserialize, Serialize};

use crate::error::ScrapeError;
use crate::pipeline::dedup::AttributionPolicy;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub scraping: ScrapingConfig,
    pub fetch: FetchConfig,
    pub logging: LoggingConfig,
    pub output: OutputConfig,
    pub sectors: Vec<SectorConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScrapingConfig {
    /// Upper bound on secondary pages visited per company website.
    pub max_contact_pages: usize,
    /// Stop attributing emails to a company once this many are collected.
    pub max_emails_per_company: usize,
    pub company_concurrency: usize,
    pub page_concurrency: usize,
    pub delay_between_companies_ms: u64,
    #[serde(default)]
    pub email_attribution: AttributionPolicy,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    /// "http" for plain requests, "browser" for the rendering service.
    pub engine: FetchEngineKind,
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    /// Minimum spacing between two requests to the same host.
    pub per_host_delay_ms: u64,
    /// Random extra delay added on top of the per-host spacing.
    pub jitter_ms: u64,
    pub browserless_url: String,
    #[serde(default)]
    pub browserless_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchEngineKind {
    Http,
    Browser,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    pub directory: String,
    pub pretty_json: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SectorConfig {
    pub name: String,
    /// First directory listing page for this sector.
    pub url: String,
    /// CSS selector matching company profile links on a listing page.
    pub link_selector: String,
    /// CSS selector for the next-page link. Common fallbacks are tried
    /// when it matches nothing.
    pub pagination_selector: String,
    pub max_pages: usize,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Config {
    /// Rejects configurations that would make a run meaningless.
    pub fn validate(&self) -> std::result::Result<(), ScrapeError> {
        if self.scraping.company_concurrency == 0 {
            return Err(ScrapeError::Config(
                "scraping.company_concurrency must be at least 1".to_string(),
            ));
        }
        if self.scraping.page_concurrency == 0 {
            return Err(ScrapeError::Config(
                "scraping.page_concurrency must be at least 1".to_string(),
            ));
        }
        if self.sectors.is_empty() {
            return Err(ScrapeError::Config(
                "at least one sector must be configured".to_string(),
            ));
        }
        for sector in &self.sectors {
            if sector.link_selector.trim().is_empty() {
                return Err(ScrapeError::Config(format!(
                    "sector '{}' has an empty link_selector",
                    sector.name
                )));
            }
            if sector.max_pages == 0 {
                return Err(ScrapeError::Config(format!(
                    "sector '{}' has max_pages set to 0",
                    sector.name
                )));
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scraping: ScrapingConfig {
                max_contact_pages: 5,
                max_emails_per_company: 5,
                company_concurrency: 4,
                page_concurrency: 8,
                delay_between_companies_ms: 3000,
                email_attribution: AttributionPolicy::default(),
            },
            fetch: FetchConfig {
                engine: FetchEngineKind::Http,
                user_agent: "Mozilla/5.0 (compatible; DirectoryScraper/1.0)".to_string(),
                timeout_seconds: 25,
                max_retries: 1,
                retry_delay_ms: 1500,
                per_host_delay_ms: 1500,
                jitter_ms: 1000,
                browserless_url: "http://localhost:3000".to_string(),
                browserless_token: None,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            output: OutputConfig {
                directory: "out".to_string(),
                pretty_json: true,
            },
            sectors: vec![SectorConfig {
                name: "wine".to_string(),
                url: "https://www.europages.co.uk/companies/wine.html".to_string(),
                link_selector: "a[data-test=\"company-name\"]".to_string(),
                pagination_selector: "a[aria-label=\"Next page\"]".to_string(),
                max_pages: 2,
                keywords: vec![
                    "wine".to_string(),
                    "winery".to_string(),
                    "vineyard".to_string(),
                    "vignoble".to_string(),
                    "weingut".to_string(),
                    "vino".to_string(),
                    "domaine".to_string(),
                    "chateau".to_string(),
                    "bodega".to_string(),
                    "cantina".to_string(),
                ],
            }],
        }
    }
}

pub async fn load_config(
    path: &str,
) -> std::result::Result<Config, Box<dyn std::error::Error + Send + Sync>> {
    let content = tokio::fs::read_to_string(path).await?;
    let mut config: Config = serde_yaml::from_str(&content)?;

    // Environment overrides the file for the service token.
    if let Ok(token) = std::env::var("BROWSERLESS_TOKEN") {
        if !token.is_empty() {
            config.fetch.browserless_token = Some(token);
        }
    }

    config.validate()?;
    Ok(config)
}
