//! GitHub pull-request source
//!
//! Searches the enhancements repository for open pull requests labelled
//! `kind/kep` and the group's label, then downloads every changed `kep.yaml`.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::domain::error::{KepError, Result};
use crate::parser::METADATA_FILE;
use crate::source::{FetchFailure, PullRequestBatch, PullRequestDocument, PullRequestSource};

/// Public GitHub REST endpoint.
pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";

const KEP_LABEL: &str = "kind/kep";

/// GitHub configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubConfig {
    /// REST API base URL
    pub api_url: String,
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Token; unauthenticated requests are heavily rate limited
    pub token: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        GitHubConfig {
            api_url: std::env::var("GITHUB_API_URL")
                .unwrap_or_else(|_| DEFAULT_GITHUB_API.to_string()),
            owner: "kubernetes".to_string(),
            repo: "enhancements".to_string(),
            token: std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()),
        }
    }
}

impl GitHubConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Set authentication token
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// Read the token from a file, trimming surrounding whitespace
    pub fn with_token_file(self, path: &Path) -> Result<Self> {
        let token = std::fs::read_to_string(path).map_err(|source| KepError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.with_token(token.trim()))
    }
}

/// GitHub label for a group: `sig-cli` → `sig/cli`, `wg-lts` → `wg/lts`.
pub fn group_label(group: &str) -> String {
    match group.split_once('-') {
        Some((kind, name)) => format!("{kind}/{name}"),
        None => group.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    number: u64,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct PullFile {
    filename: String,
    status: String,
    raw_url: String,
}

/// Pull-request source backed by the GitHub REST API.
pub struct GitHubPullRequests {
    config: GitHubConfig,
    http_client: reqwest::Client,
}

impl GitHubPullRequests {
    /// Create a new client
    pub fn new(config: GitHubConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("kep-core/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(GitHubPullRequests {
            config,
            http_client,
        })
    }

    /// Create client from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(GitHubConfig::from_env())
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let builder = self
            .http_client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json");
        match &self.config.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<reqwest::Response> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(KepError::GitHub(format!(
                "{what} failed with status {}",
                status.as_u16()
            )));
        }
        Ok(response)
    }

    async fn search_pull_requests(&self, group: &str) -> Result<Vec<SearchItem>> {
        let query = format!(
            "repo:{}/{} is:pr is:open label:{KEP_LABEL} label:{}",
            self.config.owner,
            self.config.repo,
            group_label(group)
        );
        let url = format!("{}/search/issues", self.config.api_url);
        let builder = self
            .request(&url)
            .query(&[("q", query.as_str()), ("per_page", "100")]);
        let response = self.send(builder, "pull request search").await?;
        let body: SearchResponse = response.json().await?;
        Ok(body.items)
    }

    async fn changed_files(&self, number: u64) -> Result<Vec<PullFile>> {
        let url = format!(
            "{}/repos/{}/{}/pulls/{number}/files",
            self.config.api_url, self.config.owner, self.config.repo
        );
        let builder = self.request(&url).query(&[("per_page", "100")]);
        Ok(self.send(builder, "listing pull request files").await?.json().await?)
    }

    async fn raw_contents(&self, raw_url: &str) -> Result<String> {
        let response = self.send(self.request(raw_url), "fetching raw file").await?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl PullRequestSource for GitHubPullRequests {
    async fn find_documents(&self, group: &str) -> Result<PullRequestBatch> {
        let pulls = self.search_pull_requests(group).await?;
        info!(group, pulls = pulls.len(), "found open KEP pull requests");

        let mut batch = PullRequestBatch::default();
        for pull in pulls {
            let files = match self.changed_files(pull.number).await {
                Ok(files) => files,
                Err(error) => {
                    batch.failures.push(FetchFailure {
                        location: pull.html_url.clone(),
                        error,
                    });
                    continue;
                }
            };
            for file in files {
                if file.status == "removed" || !file.filename.ends_with(METADATA_FILE) {
                    continue;
                }
                debug!(number = pull.number, path = %file.filename, "fetching KEP from pull request");
                match self.raw_contents(&file.raw_url).await {
                    Ok(contents) => batch.documents.push(PullRequestDocument {
                        number: pull.number,
                        url: pull.html_url.clone(),
                        path: file.filename,
                        contents,
                    }),
                    Err(error) => batch.failures.push(FetchFailure {
                        location: file.filename,
                        error,
                    }),
                }
            }
        }
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_label() {
        assert_eq!(group_label("sig-cli"), "sig/cli");
        assert_eq!(group_label("sig-api-machinery"), "sig/api-machinery");
        assert_eq!(group_label("wg-lts"), "wg/lts");
        assert_eq!(group_label("plain"), "plain");
    }

    #[test]
    fn test_config_with_token() {
        let config = GitHubConfig {
            api_url: DEFAULT_GITHUB_API.to_string(),
            owner: "kubernetes".to_string(),
            repo: "enhancements".to_string(),
            token: None,
        }
        .with_token("ghp_example");
        assert_eq!(config.token.as_deref(), Some("ghp_example"));
    }

    #[test]
    fn test_config_with_token_file_trims() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "  secret-token\n").unwrap();
        let config = GitHubConfig::default().with_token_file(&path).unwrap();
        assert_eq!(config.token.as_deref(), Some("secret-token"));
    }

    #[test]
    fn test_search_response_shape() {
        let response: SearchResponse = serde_json::from_str(
            r#"{"total_count": 1, "items": [{"number": 7, "html_url": "https://github.com/kubernetes/enhancements/pull/7", "title": "KEP"}]}"#,
        )
        .unwrap();
        assert_eq!(response.items[0].number, 7);
    }
}
