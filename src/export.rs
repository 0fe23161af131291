//! Runs a full export: both pull request states, one spreadsheet.

use crate::bitbucket::BitbucketClient;
use crate::config::{AppConfig, RepoId};
use crate::fetcher::PullRequestFetcher;
use crate::row::OutputRow;
use crate::types::PrState;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use rust_xlsxwriter::Workbook;
use std::path::{Path, PathBuf};

pub const SHEET_NAME: &str = "Pull Requests";

/// Orchestrates the OPEN and MERGED fetches and writes the combined result.
pub struct Exporter {
    fetcher: PullRequestFetcher,
    output_path: PathBuf,
}

impl Exporter {
    /// Builds an exporter whose lookback window ends now.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let cutoff = lookback_cutoff(Utc::now(), config.lookback_days)?;
        Self::with_cutoff(config, cutoff)
    }

    /// Builds an exporter with an explicit cutoff shared by every fetch it performs.
    pub fn with_cutoff(config: &AppConfig, cutoff: DateTime<Utc>) -> Result<Self> {
        let client = BitbucketClient::new(config)?;
        let output_path = config
            .output_dir
            .join(output_file_name(client.repo()));
        let fetcher = PullRequestFetcher::new(
            client,
            cutoff,
            config.page_len,
            config.enrich_contributors,
        );

        Ok(Self {
            fetcher,
            output_path,
        })
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Fetches both states and returns all rows, OPEN before MERGED.
    pub async fn collect_rows(&self) -> Vec<OutputRow> {
        let (open, merged) = futures::join!(
            self.fetcher.fetch_pull_requests(PrState::Open),
            self.fetcher.fetch_pull_requests(PrState::Merged),
        );

        let mut rows = open;
        rows.extend(merged);
        rows
    }

    /// Runs the export and returns the written file, or `None` when there was nothing to write.
    pub async fn run(&self) -> Result<Option<PathBuf>> {
        tracing::info!(
            cutoff = %self.fetcher.cutoff().to_rfc3339(),
            "Exporting pull requests"
        );

        let rows = self.collect_rows().await;
        if rows.is_empty() {
            tracing::info!("No pull requests found in the lookback window, skipping export");
            return Ok(None);
        }

        write_workbook(&rows, &self.output_path)?;
        tracing::info!(
            path = %self.output_path.display(),
            rows = rows.len(),
            "Exported pull requests"
        );

        Ok(Some(self.output_path.clone()))
    }
}

/// Start of the lookback window ending at `now`.
///
/// Fails for non-positive windows and for windows reaching past the representable date range.
pub fn lookback_cutoff(now: DateTime<Utc>, lookback_days: i64) -> Result<DateTime<Utc>> {
    if lookback_days <= 0 {
        bail!("Lookback window must be at least one day, got {}", lookback_days);
    }

    Duration::try_days(lookback_days)
        .and_then(|window| now.checked_sub_signed(window))
        .with_context(|| format!("Lookback window of {} days is out of range", lookback_days))
}

pub fn output_file_name(repo: &RepoId) -> String {
    format!("{}_pull_requests.xlsx", repo.repo_slug)
}

/// Writes `rows` to a new workbook at `path`: one header row, then one row per entry.
pub fn write_workbook(rows: &[OutputRow], path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(SHEET_NAME)
        .context("Failed to name worksheet")?;

    if let Some(first) = rows.first() {
        worksheet
            .serialize_headers(0, 0, first)
            .context("Failed to write header row")?;
    }
    for row in rows {
        worksheet
            .serialize(row)
            .with_context(|| format!("Failed to write row for pull request #{}", row.id))?;
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to save workbook to {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_lookback_cutoff() {
        let now = Utc.with_ymd_and_hms(2024, 4, 30, 12, 0, 0).unwrap();
        let cutoff = lookback_cutoff(now, 90).unwrap();
        assert_eq!(cutoff, Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_lookback_cutoff_rejects_bad_windows() {
        let now = Utc.with_ymd_and_hms(2024, 4, 30, 12, 0, 0).unwrap();

        assert!(lookback_cutoff(now, 0).is_err());
        assert!(lookback_cutoff(now, -5).is_err());
        assert!(lookback_cutoff(now, 100_000_000).is_err());
        assert!(lookback_cutoff(now, i64::MAX).is_err());
    }

    #[test]
    fn test_exporter_new_fails_on_huge_window() {
        let mut config = AppConfig::new(
            crate::config::Credentials {
                username: "user".to_string(),
                secret: "secret".to_string(),
            },
            RepoId {
                workspace: "acme".to_string(),
                repo_slug: "widgets".to_string(),
            },
        );
        config.lookback_days = 100_000_000;

        assert!(Exporter::new(&config).is_err());
    }

    #[test]
    fn test_output_file_name() {
        let repo = RepoId {
            workspace: "acme".to_string(),
            repo_slug: "widgets".to_string(),
        };
        assert_eq!(output_file_name(&repo), "widgets_pull_requests.xlsx");
    }
}
