//! Resolves the people who authored commits on a pull request.

use crate::bitbucket::BitbucketClient;
use crate::types::{Account, Commit, Page};
use anyhow::Result;
use std::collections::HashSet;

/// Returns the deduplicated commit authors of pull request `pr_id`.
///
/// Any failure while paging through the commit list is logged and resolves to an empty list;
/// callers always get a value back.
pub async fn resolve_contributors(client: &BitbucketClient, pr_id: u64) -> Vec<String> {
    match try_resolve_contributors(client, pr_id).await {
        Ok(names) => names,
        Err(e) => {
            tracing::error!(pr_id, "Failed to fetch commits: {:#}", e);
            Vec::new()
        }
    }
}

/// Pages through the commit list of `pr_id`, collecting author names in first-seen order.
pub async fn try_resolve_contributors(client: &BitbucketClient, pr_id: u64) -> Result<Vec<String>> {
    let mut names: Vec<String> = Vec::new();
    let mut next_url = Some(client.commits_url(pr_id));
    let mut visited = HashSet::new();

    while let Some(url) = next_url {
        if !visited.insert(url.clone()) {
            tracing::warn!(pr_id, url = %url, "Commit cursor repeated, stopping");
            break;
        }
        let page: Page<Commit> = client.get_page(&url).await?;

        for name in page.values.iter().filter_map(contributor_name) {
            if !names.contains(&name) {
                names.push(name);
            }
        }

        next_url = page.next;
    }

    tracing::debug!(pr_id, count = names.len(), "Resolved contributors");
    Ok(names)
}

/// Extracts a display name from a commit.
///
/// A linked Bitbucket account wins; otherwise the name part of the raw `Name <email>` string
/// is used. Returns `None` when neither yields a non-empty name.
pub fn contributor_name(commit: &Commit) -> Option<String> {
    let author = commit.author.as_ref()?;

    if let Some(name) = author.user.as_ref().and_then(Account::name) {
        return Some(name.to_string());
    }

    let raw = author.raw.as_deref()?;
    let name = raw.split('<').next().unwrap_or(raw).trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
