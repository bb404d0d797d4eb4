//! GitHub release lookups.

use serde::Deserialize;
use thiserror::Error;

use crate::httpx;

/// Hostname that marks a repository as GitHub-hosted.
pub const HOSTNAME: &str = "github.com";

const API_URL: &str = "https://api.github.com";

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("invalid repository url: {0}")]
    InvalidRepoUrl(String),

    #[error("{0}")]
    Http(#[from] httpx::HttpError),
}

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
}

/// Extracts owner and repo names from a repository url.
pub fn parse_repo_url(repo_url: &str) -> Result<(String, String), GithubError> {
    let url = reqwest::Url::parse(repo_url)
        .map_err(|_| GithubError::InvalidRepoUrl(repo_url.to_string()))?;
    let parts: Vec<&str> = url
        .path()
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    if parts.len() != 2 {
        return Err(GithubError::InvalidRepoUrl(repo_url.to_string()));
    }
    Ok((parts[0].to_string(), parts[1].to_string()))
}

/// Fetches the latest release tag for the repository.
pub fn latest_tag(owner: &str, repo: &str) -> Result<String, GithubError> {
    let url = format!("{API_URL}/repos/{owner}/{repo}/releases/latest");
    let release: Release = httpx::get_json(&url)?;
    Ok(release.tag_name)
}
