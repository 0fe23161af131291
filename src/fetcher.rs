//! Pages through a repository's pull requests and turns them into spreadsheet rows.
//!
//! For each page this module:
//! 1. Drops pull requests created before the cutoff.
//! 2. Resolves contributors for every remaining pull request concurrently.
//! 3. Waits for all of those lookups before following the `next` cursor.

use crate::bitbucket::BitbucketClient;
use crate::contributors;
use crate::row::{self, OutputRow};
use crate::types::{Page, PrState, PullRequest};
use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::HashSet;

/// Fetches pull requests for one state and flattens them into rows.
#[derive(Clone, Debug)]
pub struct PullRequestFetcher {
    client: BitbucketClient,
    cutoff: DateTime<Utc>,
    page_len: u32,
    enrich_contributors: bool,
}

impl PullRequestFetcher {
    /// `cutoff` is a fixed snapshot; pull requests created before it are skipped.
    pub fn new(
        client: BitbucketClient,
        cutoff: DateTime<Utc>,
        page_len: u32,
        enrich_contributors: bool,
    ) -> Self {
        Self {
            client,
            cutoff,
            page_len,
            enrich_contributors,
        }
    }

    pub fn cutoff(&self) -> DateTime<Utc> {
        self.cutoff
    }

    /// Returns the rows for every pull request in `state` created on or after the cutoff.
    ///
    /// A failure anywhere in the run is logged and the whole state resolves to an empty list.
    pub async fn fetch_pull_requests(&self, state: PrState) -> Vec<OutputRow> {
        match self.try_fetch_pull_requests(&state).await {
            Ok(rows) => {
                tracing::info!(state = %state, count = rows.len(), "Fetched pull requests");
                rows
            }
            Err(e) => {
                tracing::error!(state = %state, "Failed to fetch pull requests: {:#}", e);
                Vec::new()
            }
        }
    }

    /// Follows the `next` cursor until the listing is exhausted.
    pub async fn try_fetch_pull_requests(&self, state: &PrState) -> Result<Vec<OutputRow>> {
        let mut rows = Vec::new();
        let mut next_url = Some(self.client.pull_requests_url(state, self.page_len));
        let mut page_count = 0;
        let mut visited = HashSet::new();

        while let Some(url) = next_url {
            if !visited.insert(url.clone()) {
                tracing::warn!(state = %state, url = %url, "Pull request cursor repeated, stopping");
                break;
            }
            let page: Page<PullRequest> = self.client.get_page(&url).await?;
            page_count += 1;

            let page_rows = self.process_pr_page(page.values).await;
            tracing::debug!(
                state = %state,
                page = page_count,
                kept = page_rows.len(),
                "Processed pull request page"
            );
            rows.extend(page_rows);

            next_url = page.next;
        }

        Ok(rows)
    }

    /// Filters one page by the cutoff and builds its rows, keeping page order.
    async fn process_pr_page(&self, prs: Vec<PullRequest>) -> Vec<OutputRow> {
        let recent: Vec<PullRequest> = prs
            .into_iter()
            .filter(|pr| pr.created_on >= self.cutoff)
            .collect();

        if !self.enrich_contributors {
            return recent.iter().map(|pr| row::build_row(pr, &[])).collect();
        }

        let lookups = recent
            .iter()
            .map(|pr| contributors::resolve_contributors(&self.client, pr.id));
        let resolved = join_all(lookups).await;

        recent
            .iter()
            .zip(resolved)
            .map(|(pr, names)| row::build_row(pr, &names))
            .collect()
    }
}
