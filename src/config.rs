//! Application configuration and environment variable parsing.
//!
//! Settings are read from the environment (optionally seeded from a `.env` file by `main`).
//! The four Bitbucket settings are required; everything else has a default so a bare
//! export only needs credentials and the target repository.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

const DEFAULT_API_BASE_URL: &str = "https://api.bitbucket.org/2.0";

/// Identifies a Bitbucket repository.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    /// The workspace owning the repository (e.g., "atlassian").
    pub workspace: String,
    /// The repository slug (e.g., "python-bitbucket").
    pub repo_slug: String,
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.workspace, self.repo_slug)
    }
}

/// Basic-auth credentials applied to every API request.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Application configuration loaded from environment variables.
#[derive(Clone, Deserialize)]
pub struct AppConfig {
    /// Bitbucket account name used for Basic authentication.
    pub bitbucket_username: String,

    /// App password (or access token) paired with `bitbucket_username`.
    pub bitbucket_app_password: String,

    /// Workspace that owns the target repository.
    pub bitbucket_workspace: String,

    /// Slug of the target repository.
    pub bitbucket_repo_slug: String,

    /// Only pull requests created within this many days before startup are exported.
    #[serde(
        default = "default_lookback_days",
        deserialize_with = "deserialize_lookback_days"
    )]
    pub lookback_days: i64,

    /// Page size hint sent with every pull request listing.
    #[serde(default = "default_page_len")]
    pub page_len: u32,

    /// Root of the REST API. Overridden in tests to point at a mock server.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Directory the spreadsheet is written into.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Whether to resolve commit authors for each pull request.
    #[serde(default = "default_enrich_contributors")]
    pub enrich_contributors: bool,
}

fn default_lookback_days() -> i64 {
    90
}

fn deserialize_lookback_days<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let days: i64 = Deserialize::deserialize(deserializer)?;
    if days <= 0 {
        return Err(serde::de::Error::custom(format!(
            "lookback_days must be positive, got {}",
            days
        )));
    }
    Ok(days)
}

fn default_page_len() -> u32 {
    50
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_enrich_contributors() -> bool {
    true
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// Builds a config for `repo` with every optional setting at its default.
    pub fn new(credentials: Credentials, repo: RepoId) -> Self {
        Self {
            bitbucket_username: credentials.username,
            bitbucket_app_password: credentials.secret,
            bitbucket_workspace: repo.workspace,
            bitbucket_repo_slug: repo.repo_slug,
            lookback_days: default_lookback_days(),
            page_len: default_page_len(),
            api_base_url: default_api_base_url(),
            output_dir: default_output_dir(),
            enrich_contributors: default_enrich_contributors(),
        }
    }

    pub fn repo_id(&self) -> RepoId {
        RepoId {
            workspace: self.bitbucket_workspace.clone(),
            repo_slug: self.bitbucket_repo_slug.clone(),
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.bitbucket_username.clone(),
            secret: self.bitbucket_app_password.clone(),
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("credentials", &self.credentials())
            .field("repo", &self.repo_id())
            .field("lookback_days", &self.lookback_days)
            .field("page_len", &self.page_len)
            .field("api_base_url", &self.api_base_url)
            .field("output_dir", &self.output_dir)
            .field("enrich_contributors", &self.enrich_contributors)
            .finish()
    }
}
