use dialoguer::{theme::ColorfulTheme, Select};

use crate::{
    cli::cli::MenuAction,
    models::{CliApp, Result},
};
use tracing::error;

impl CliApp {
    pub async fn run(&self) -> Result<()> {
        println!("\n🏢 Welcome to Directory Scraper!");
        println!("═══════════════════════════════════════");
        println!(
            "{} sectors configured, output goes to {}/",
            self.config.sectors.len(),
            self.config.output.directory
        );

        loop {
            let actions = vec![
                MenuAction::ScrapeAllSectors,
                MenuAction::ScrapeSingleSector,
                MenuAction::ProbeSelectors,
                MenuAction::ShowConfig,
                MenuAction::Exit,
            ];

            let selection = Select::with_theme(&ColorfulTheme::default())
                .with_prompt("\nSelect an action")
                .default(0)
                .items(&actions)
                .interact()?;

            match &actions[selection] {
                MenuAction::ScrapeAllSectors => {
                    if let Err(e) = self.run_scrape_all().await {
                        error!("Scrape failed: {}", e);
                    }
                }
                MenuAction::ScrapeSingleSector => {
                    if let Err(e) = self.run_scrape_single().await {
                        error!("Scrape failed: {}", e);
                    }
                }
                MenuAction::ProbeSelectors => {
                    if let Err(e) = self.run_probe_selectors().await {
                        error!("Selector probe failed: {}", e);
                    }
                }
                MenuAction::ShowConfig => {
                    if let Err(e) = self.show_config() {
                        error!("Failed to show configuration: {}", e);
                    }
                }
                MenuAction::Exit => {
                    println!("\n👋 Thanks for using Directory Scraper!");
                    break;
                }
            }
        }

        Ok(())
    }
}
