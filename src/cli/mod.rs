pub mod cli;
pub mod run;
pub mod run_probe;
pub mod run_scrape;
pub mod show_config;

pub use cli::MenuAction;
