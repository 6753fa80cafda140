use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::fetch::FetchEngine;
use crate::models::{CliApp, Result};

#[derive(Debug, Clone)]
pub enum MenuAction {
    ScrapeAllSectors,
    ScrapeSingleSector,
    ProbeSelectors,
    ShowConfig,
    Exit,
}

impl std::fmt::Display for MenuAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MenuAction::ScrapeAllSectors => {
                write!(f, "🏭 Scrape all configured sectors")
            }
            MenuAction::ScrapeSingleSector => {
                write!(f, "🎯 Scrape a single sector")
            }
            MenuAction::ProbeSelectors => {
                write!(f, "🔬 Probe CSS selectors on a listing page")
            }
            MenuAction::ShowConfig => write!(f, "⚙️  Show configuration"),
            MenuAction::Exit => write!(f, "🚪 Exit"),
        }
    }
}

impl CliApp {
    pub fn new(config: Config) -> Result<Self> {
        let engine = Arc::new(FetchEngine::from_config(&config.fetch)?);
        info!(
            "Fetch engine ready ({:?} mode, {} retries)",
            config.fetch.engine, config.fetch.max_retries
        );

        Ok(Self { config, engine })
    }
}
