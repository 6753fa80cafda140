use directory_scraper::config::{load_config, Config};
use directory_scraper::models::{CliApp, Result};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let config = match load_config("config.yml").await {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load config.yml: {}. Using defaults.", e);
            Config::default()
        }
    };

    // Setup logging
    std::env::set_var(
        "RUST_LOG",
        format!(
            "directory_scraper={},hyper=warn,reqwest=warn",
            config.logging.level
        ),
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("directory_scraper=info".parse().unwrap()),
        )
        .init();

    // Create output directory
    tokio::fs::create_dir_all(&config.output.directory).await?;

    // Initialize and run CLI app
    let app = CliApp::new(config)?;

    // Add graceful shutdown
    tokio::select! {
        result = app.run() => {
            result?;
        }
        _ = signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
