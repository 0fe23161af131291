//! Exports a Bitbucket repository's recent pull requests to a spreadsheet.
//!
//! Open and merged pull requests created within the lookback window are fetched
//! concurrently, enriched with the authors of their commits, flattened into rows and
//! written to a single `.xlsx` sheet.

pub mod bitbucket;
pub mod config;
pub mod contributors;
pub mod export;
pub mod fetcher;
pub mod row;
pub mod types;

use config::AppConfig;
use export::Exporter;
use std::path::PathBuf;

/// Runs one export for `config`, returning the path of the written file if any.
pub async fn run(config: &AppConfig) -> anyhow::Result<Option<PathBuf>> {
    let exporter = Exporter::new(config)?;
    tracing::info!(repo = %config.repo_id(), "Starting pull request export");
    exporter.run().await
}
