//! Raw records returned by the Bitbucket REST API.
//!
//! Every optional field the API may omit is declared explicitly, and the defaults used when
//! flattening a record into a spreadsheet row live next to the type they belong to.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;

pub const UNKNOWN_BRANCH: &str = "Unknown";
pub const UNKNOWN_AUTHOR: &str = "Unknown";
pub const NOT_AVAILABLE: &str = "N/A";

/// One page of a cursor-paginated listing.
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub values: Vec<T>,
    /// Absolute URL of the next page; `None` once the listing is exhausted.
    #[serde(default)]
    pub next: Option<String>,
}

/// Lifecycle state of a pull request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum PrState {
    Open,
    Merged,
    Declined,
    Superseded,
    /// Any state this tool doesn't know about, kept verbatim.
    Other(String),
}

impl From<String> for PrState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "OPEN" => PrState::Open,
            "MERGED" => PrState::Merged,
            "DECLINED" => PrState::Declined,
            "SUPERSEDED" => PrState::Superseded,
            _ => PrState::Other(value),
        }
    }
}

impl fmt::Display for PrState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrState::Open => f.write_str("OPEN"),
            PrState::Merged => f.write_str("MERGED"),
            PrState::Declined => f.write_str("DECLINED"),
            PrState::Superseded => f.write_str("SUPERSEDED"),
            PrState::Other(other) => f.write_str(other),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Account {
    /// The display name, if the account carries a non-blank one.
    pub fn name(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Branch {
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Endpoint {
    pub branch: Option<Branch>,
}

impl Endpoint {
    fn branch_name(endpoint: &Option<Endpoint>) -> String {
        endpoint
            .as_ref()
            .and_then(|e| e.branch.as_ref())
            .and_then(|b| b.name.clone())
            .unwrap_or_else(|| UNKNOWN_BRANCH.to_string())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Link {
    pub href: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PullRequestLinks {
    pub html: Option<Link>,
}

/// A pull request as listed by `/repositories/{workspace}/{repo}/pullrequests`.
#[derive(Clone, Debug, Deserialize)]
pub struct PullRequest {
    pub id: u64,
    pub title: String,
    pub state: PrState,
    #[serde(default)]
    pub author: Option<Account>,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
    #[serde(default)]
    pub source: Option<Endpoint>,
    #[serde(default)]
    pub destination: Option<Endpoint>,
    #[serde(default)]
    pub links: Option<PullRequestLinks>,
    #[serde(default)]
    pub comments_count: Option<u64>,
    #[serde(default)]
    pub closed_by: Option<Account>,
}

impl PullRequest {
    pub fn author_name(&self) -> &str {
        self.author
            .as_ref()
            .and_then(Account::name)
            .unwrap_or(UNKNOWN_AUTHOR)
    }

    pub fn source_branch(&self) -> String {
        Endpoint::branch_name(&self.source)
    }

    pub fn destination_branch(&self) -> String {
        Endpoint::branch_name(&self.destination)
    }

    pub fn html_link(&self) -> String {
        self.links
            .as_ref()
            .and_then(|l| l.html.as_ref())
            .and_then(|h| h.href.clone())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    pub fn comment_count(&self) -> u64 {
        self.comments_count.unwrap_or(0)
    }

    pub fn closer_name(&self) -> String {
        self.closed_by
            .as_ref()
            .and_then(Account::name)
            .unwrap_or(NOT_AVAILABLE)
            .to_string()
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CommitAuthor {
    #[serde(default)]
    pub user: Option<Account>,
    #[serde(default)]
    pub raw: Option<String>,
}

/// A commit as listed by `/pullrequests/{id}/commits`.
#[derive(Clone, Debug, Deserialize)]
pub struct Commit {
    #[serde(default)]
    pub author: Option<CommitAuthor>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_minimal_pull_request_uses_defaults() {
        let pr: PullRequest = serde_json::from_value(json!({
            "id": 7,
            "title": "Bare PR",
            "state": "OPEN",
            "author": { "display_name": "Alice" },
            "created_on": "2024-03-01T10:00:00.000000+00:00",
            "updated_on": "2024-03-02T10:00:00.000000+00:00"
        }))
        .unwrap();

        assert_eq!(pr.id, 7);
        assert_eq!(pr.state, PrState::Open);
        assert_eq!(pr.author_name(), "Alice");
        assert_eq!(pr.source_branch(), "Unknown");
        assert_eq!(pr.destination_branch(), "Unknown");
        assert_eq!(pr.html_link(), "N/A");
        assert_eq!(pr.comment_count(), 0);
        assert_eq!(pr.closer_name(), "N/A");
    }

    #[test]
    fn test_deserialize_full_pull_request() {
        let pr: PullRequest = serde_json::from_value(json!({
            "id": 8,
            "title": "Full PR",
            "state": "MERGED",
            "author": { "display_name": "Alice" },
            "created_on": "2024-03-01T10:00:00+00:00",
            "updated_on": "2024-03-02T10:00:00+00:00",
            "source": { "branch": { "name": "feature/x" } },
            "destination": { "branch": { "name": "main" } },
            "links": { "html": { "href": "https://bitbucket.org/acme/widgets/pull-requests/8" } },
            "comments_count": 4,
            "closed_by": { "display_name": "Bob" }
        }))
        .unwrap();

        assert_eq!(pr.state, PrState::Merged);
        assert_eq!(pr.source_branch(), "feature/x");
        assert_eq!(pr.destination_branch(), "main");
        assert_eq!(
            pr.html_link(),
            "https://bitbucket.org/acme/widgets/pull-requests/8"
        );
        assert_eq!(pr.comment_count(), 4);
        assert_eq!(pr.closer_name(), "Bob");
    }

    #[test]
    fn test_null_optionals_fall_back() {
        let pr: PullRequest = serde_json::from_value(json!({
            "id": 9,
            "title": "Nulls",
            "state": "DECLINED",
            "author": null,
            "created_on": "2024-03-01T10:00:00Z",
            "updated_on": "2024-03-01T10:00:00Z",
            "source": { "branch": null },
            "comments_count": null,
            "closed_by": null
        }))
        .unwrap();

        assert_eq!(pr.author_name(), "Unknown");
        assert_eq!(pr.source_branch(), "Unknown");
        assert_eq!(pr.comment_count(), 0);
        assert_eq!(pr.closer_name(), "N/A");
    }

    #[test]
    fn test_nameless_accounts_fall_back() {
        let pr: PullRequest = serde_json::from_value(json!({
            "id": 10,
            "title": "Nameless",
            "state": "MERGED",
            "author": { "uuid": "{1234}" },
            "created_on": "2024-03-01T10:00:00Z",
            "updated_on": "2024-03-01T10:00:00Z",
            "closed_by": {}
        }))
        .unwrap();

        assert_eq!(pr.author_name(), "Unknown");
        assert_eq!(pr.closer_name(), "N/A");

        let pr: PullRequest = serde_json::from_value(json!({
            "id": 11,
            "title": "Null name",
            "state": "MERGED",
            "author": { "display_name": "Alice" },
            "created_on": "2024-03-01T10:00:00Z",
            "updated_on": "2024-03-01T10:00:00Z",
            "closed_by": { "display_name": null, "uuid": "{5678}" }
        }))
        .unwrap();

        assert_eq!(pr.closer_name(), "N/A");
    }

    #[test]
    fn test_commit_page_with_nameless_user_decodes() {
        let page: Page<Commit> = serde_json::from_value(json!({
            "values": [
                { "author": { "user": { "uuid": "{x}" }, "raw": "Carol Smith <carol@x.com>" } },
                { "author": { "user": { "display_name": null }, "raw": "Dave <dave@x.com>" } }
            ]
        }))
        .unwrap();

        assert_eq!(page.values.len(), 2);
    }

    #[test]
    fn test_unknown_state_passes_through() {
        let state = PrState::from("QUEUED".to_string());
        assert_eq!(state, PrState::Other("QUEUED".to_string()));
        assert_eq!(state.to_string(), "QUEUED");
        assert_eq!(PrState::Merged.to_string(), "MERGED");
    }

    #[test]
    fn test_page_without_next() {
        let page: Page<Commit> = serde_json::from_value(json!({ "values": [{}], "next": null })).unwrap();
        assert_eq!(page.values.len(), 1);
        assert!(page.next.is_none());

        let empty: Page<Commit> = serde_json::from_value(json!({})).unwrap();
        assert!(empty.values.is_empty());
    }
}
