//! Flattening of pull requests into spreadsheet rows.

use crate::types::PullRequest;
use chrono::SecondsFormat;
use serde::Serialize;

/// One exported spreadsheet row. Field names double as the column headers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutputRow {
    #[serde(rename = "ID")]
    pub id: u64,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Author")]
    pub author: String,
    #[serde(rename = "Created On")]
    pub created_on: String,
    #[serde(rename = "Updated On")]
    pub updated_on: String,
    #[serde(rename = "Source Branch")]
    pub source_branch: String,
    #[serde(rename = "Destination Branch")]
    pub destination_branch: String,
    #[serde(rename = "Link")]
    pub link: String,
    #[serde(rename = "Comments")]
    pub comments: u64,
    #[serde(rename = "Closed By")]
    pub closed_by: String,
    #[serde(rename = "Contributors")]
    pub contributors: String,
}

/// Builds the row for `pr`, listing its author alongside the resolved commit authors.
pub fn build_row(pr: &PullRequest, contributors: &[String]) -> OutputRow {
    let author = pr.author_name();

    OutputRow {
        id: pr.id,
        title: pr.title.clone(),
        state: pr.state.to_string(),
        author: author.to_string(),
        created_on: pr.created_on.to_rfc3339_opts(SecondsFormat::Secs, true),
        updated_on: pr.updated_on.to_rfc3339_opts(SecondsFormat::Secs, true),
        source_branch: pr.source_branch(),
        destination_branch: pr.destination_branch(),
        link: pr.html_link(),
        comments: pr.comment_count(),
        closed_by: pr.closer_name(),
        contributors: merge_contributors(author, contributors).join(", "),
    }
}

/// Author first, then every other contributor once.
pub fn merge_contributors(author: &str, contributors: &[String]) -> Vec<String> {
    let mut merged = vec![author.to_string()];
    for name in contributors {
        if !merged.contains(name) {
            merged.push(name.clone());
        }
    }
    merged
}
