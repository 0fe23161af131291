//! Thin authenticated client for the Bitbucket Cloud REST API.

use crate::config::{AppConfig, Credentials, RepoId};
use crate::types::{Page, PrState};
use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;

const USER_AGENT: &str = concat!("pr-export/", env!("CARGO_PKG_VERSION"));

#[derive(Clone, Debug)]
pub struct BitbucketClient {
    client: Client,
    base_url: String,
    credentials: Credentials,
    repo: RepoId,
}

impl BitbucketClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            credentials: config.credentials(),
            repo: config.repo_id(),
        })
    }

    pub fn repo(&self) -> &RepoId {
        &self.repo
    }

    /// URL of the first page of pull requests in `state`.
    pub fn pull_requests_url(&self, state: &PrState, page_len: u32) -> String {
        format!(
            "{}/repositories/{}/{}/pullrequests?state={}&pagelen={}",
            self.base_url, self.repo.workspace, self.repo.repo_slug, state, page_len
        )
    }

    /// URL of the first page of commits belonging to pull request `pr_id`.
    pub fn commits_url(&self, pr_id: u64) -> String {
        format!(
            "{}/repositories/{}/{}/pullrequests/{}/commits",
            self.base_url, self.repo.workspace, self.repo.repo_slug, pr_id
        )
    }

    /// Whether `url` lives under the configured API root, so credentials may be attached.
    fn is_api_url(&self, url: &str) -> bool {
        url.strip_prefix(&self.base_url)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'))
    }

    /// Fetches and decodes one page of a paginated listing.
    ///
    /// `url` is used verbatim, so `next` links returned by the server can be passed straight
    /// back in, but credentials are only attached to URLs under the API root. Non-success
    /// statuses and undecodable bodies are reported with the response body.
    pub async fn get_page<T: DeserializeOwned>(&self, url: &str) -> Result<Page<T>> {
        let mut request = self.client.get(url).header("Accept", "application/json");
        if self.is_api_url(url) {
            request = request.basic_auth(&self.credentials.username, Some(&self.credentials.secret));
        } else {
            tracing::warn!(url, "Cursor points outside the API base URL, sending without credentials");
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))?;

        if !status.is_success() {
            bail!("Bitbucket API returned HTTP {} for {}: {}", status, url, body);
        }

        serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse response from {}: {}", url, body))
    }
}
