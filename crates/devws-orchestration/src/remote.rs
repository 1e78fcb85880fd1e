//! Remote preset sources.
//!
//! The resolver consumes the [`RemoteSource`] trait; the default
//! implementation talks to the GitHub REST API. Tests substitute a local
//! mock.

use crate::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// A repository host the resolver can enumerate and download from.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Tag names of a repository, newest first as reported by the host.
    async fn list_tags(&self, repo: &str) -> Result<Vec<String>>;

    /// Branch names of a repository.
    async fn list_branches(&self, repo: &str) -> Result<Vec<String>>;

    /// Fetch the preset config file at a ref, if present.
    async fn fetch_config(&self, repo: &str, reference: &str) -> Result<Option<String>>;

    /// Download the repository archive at a ref as a gzipped tarball.
    async fn download_archive(&self, repo: &str, reference: &str) -> Result<Vec<u8>>;
}

#[derive(Deserialize)]
struct RefEntry {
    name: String,
}

/// GitHub-backed remote source.
pub struct GithubSource {
    client: reqwest::Client,
    api_base: String,
    raw_base: String,
    archive_base: String,
}

impl GithubSource {
    /// Source against the public GitHub endpoints.
    pub fn new() -> Self {
        Self::with_bases(
            "https://api.github.com",
            "https://raw.githubusercontent.com",
            "https://codeload.github.com",
        )
    }

    /// Source against explicit endpoints. Lets tests point at a local server.
    pub fn with_bases(
        api_base: impl Into<String>,
        raw_base: impl Into<String>,
        archive_base: impl Into<String>,
    ) -> Self {
        GithubSource {
            client: reqwest::Client::builder()
                .user_agent(concat!("devws/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_default(),
            api_base: api_base.into(),
            raw_base: raw_base.into(),
            archive_base: archive_base.into(),
        }
    }

    async fn list_refs(&self, repo: &str, kind: &str) -> Result<Vec<String>> {
        let url = format!("{}/repos/{}/{}?per_page=100", self.api_base, repo, kind);
        debug!("GET {}", url);
        let entries: Vec<RefEntry> = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(entries.into_iter().map(|e| e.name).collect())
    }
}

impl Default for GithubSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteSource for GithubSource {
    async fn list_tags(&self, repo: &str) -> Result<Vec<String>> {
        self.list_refs(repo, "tags").await
    }

    async fn list_branches(&self, repo: &str) -> Result<Vec<String>> {
        self.list_refs(repo, "branches").await
    }

    async fn fetch_config(&self, repo: &str, reference: &str) -> Result<Option<String>> {
        let url = format!("{}/{}/{}/config.json", self.raw_base, repo, reference);
        debug!("GET {}", url);
        let response = self.client.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(response.error_for_status()?.text().await?))
    }

    async fn download_archive(&self, repo: &str, reference: &str) -> Result<Vec<u8>> {
        let url = format!("{}/{}/tar.gz/{}", self.archive_base, repo, reference);
        debug!("GET {}", url);
        let bytes = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}
