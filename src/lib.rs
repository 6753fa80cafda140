pub mod cli;
pub mod config;
pub mod directory;
pub mod error;
pub mod export;
pub mod fetch;
pub mod models;
pub mod pipeline;
pub mod stats;
