use dialoguer::{theme::ColorfulTheme, Confirm, Select};
use tracing::warn;

use crate::{
    config::SectorConfig,
    directory::DirectoryTraverser,
    export::{write_run_report, CsvExporter},
    models::{CliApp, Result, SectorVocabulary},
    pipeline::PipelineOrchestrator,
    stats::RunReport,
};

impl CliApp {
    pub async fn run_scrape_all(&self) -> Result<()> {
        let proceed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "Scrape all {} configured sectors?",
                self.config.sectors.len()
            ))
            .default(true)
            .interact()?;
        if !proceed {
            return Ok(());
        }

        for sector in &self.config.sectors {
            if let Err(e) = self.scrape_sector(sector).await {
                warn!("Sector '{}' failed: {}", sector.name, e);
            }
        }
        Ok(())
    }

    pub async fn run_scrape_single(&self) -> Result<()> {
        let names: Vec<&str> = self
            .config
            .sectors
            .iter()
            .map(|s| s.name.as_str())
            .collect();

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Select a sector")
            .items(&names)
            .interact()?;

        self.scrape_sector(&self.config.sectors[selection]).await
    }

    async fn scrape_sector(&self, sector: &SectorConfig) -> Result<()> {
        println!("\n🏭 Sector: {}", sector.name);
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        let mut report = RunReport::new(&sector.name);

        let traverser = DirectoryTraverser::new(sector.clone())?;
        let seeds = traverser.collect_seeds(self.engine.as_ref()).await?;
        if seeds.is_empty() {
            println!("❌ No companies found on the listing pages");
            return Ok(());
        }

        let vocabulary = SectorVocabulary::new(&sector.name, &sector.keywords);
        let orchestrator =
            PipelineOrchestrator::new(self.engine.clone(), self.config.scraping.clone());
        let (records, stats) = orchestrator.run(seeds, &vocabulary).await;

        let exporter = CsvExporter::new(&self.config.output.directory);
        exporter.export_links(&sector.name, &records).await?;
        exporter.export_emails(&sector.name, &records).await?;

        report.stats = stats;
        write_run_report(
            &self.config.output.directory,
            &report,
            self.config.output.pretty_json,
        )
        .await?;

        report.stats.print_summary();
        Ok(())
    }
}
