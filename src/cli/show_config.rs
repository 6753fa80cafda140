use crate::config::FetchEngineKind;
use crate::models::{CliApp, Result};
use crate::pipeline::dedup::AttributionPolicy;

impl CliApp {
    pub fn show_config(&self) -> Result<()> {
        let config = &self.config;

        println!("\n⚙️  Current Configuration");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━");

        let engine = match config.fetch.engine {
            FetchEngineKind::Http => "http",
            FetchEngineKind::Browser => "browser (http fallback)",
        };
        println!("🌐 Fetch engine: {}", engine);
        println!("🕵️  User agent: {}", config.fetch.user_agent);
        println!(
            "⏱️  Timeout: {}s, retries: {}, retry delay: {}ms",
            config.fetch.timeout_seconds, config.fetch.max_retries, config.fetch.retry_delay_ms
        );
        println!(
            "🚦 Per-host spacing: {}ms + up to {}ms jitter",
            config.fetch.per_host_delay_ms, config.fetch.jitter_ms
        );
        if config.fetch.engine == FetchEngineKind::Browser {
            let token = if config.fetch.browserless_token.is_some() {
                "set"
            } else {
                "not set"
            };
            println!(
                "🖥️  Browserless: {} (token {})",
                config.fetch.browserless_url, token
            );
        }

        println!(
            "\n🏭 Concurrency: {} companies, {} pages",
            config.scraping.company_concurrency, config.scraping.page_concurrency
        );
        println!(
            "⏳ Delay between companies: {}ms",
            config.scraping.delay_between_companies_ms
        );
        println!(
            "📄 Contact pages per site: up to {}",
            config.scraping.max_contact_pages
        );
        println!(
            "📧 Emails per company: up to {}",
            config.scraping.max_emails_per_company
        );
        let attribution = match config.scraping.email_attribution {
            AttributionPolicy::FirstCompany => "first company seen keeps a shared email",
            AttributionPolicy::EveryCompany => "every company keeps shared emails",
        };
        println!("🔗 Email attribution: {}", attribution);

        println!(
            "\n💾 Output: {}/ (pretty JSON: {})",
            config.output.directory, config.output.pretty_json
        );
        println!("🪵 Log level: {}", config.logging.level);

        println!("\n📚 Sectors ({}):", config.sectors.len());
        for sector in &config.sectors {
            println!(
                "  • {} ({} pages max, {} keywords)",
                sector.name,
                sector.max_pages,
                sector.keywords.len()
            );
            println!("    {}", sector.url);
        }

        Ok(())
    }
}
