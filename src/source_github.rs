//! GitHub repository README source.
//!
//! Uses the REST contents API:
//!
//! 1. `GET /repos/{owner}/{project}/contents/` lists the repository root.
//! 2. Candidate names are walked in priority order. A candidate is probed only
//!    if a root entry of type `file` has that name once lowercased.
//! 3. `GET /repos/{owner}/{project}/contents/{name}` fetches the file as
//!    base64. The first probe with non-empty content wins.
//! 4. After an unsuccessful probe the source pauses for the configured probe
//!    delay before trying the next candidate, to stay clear of rate limits.
//!
//! A failed listing (network error, 401/403 rate limiting, 404) is reported as
//! a transport error. A failed probe is recorded and the loop moves on.

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::config::{GitHubConfig, HttpConfig};
use crate::error::RampUpError;
use crate::models::{
    DocLookup, Encoding, FetchAttempt, FetchOutcome, Host, RawDocument, ResourceIdentity,
};
use crate::source::DocumentSource;

/// One entry of a directory listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// A single file from the contents API.
#[derive(Debug, Deserialize)]
struct FileContent {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

pub struct GitHubSource {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
    candidates: Vec<String>,
    probe_delay: Duration,
}

impl GitHubSource {
    pub fn new(github: &GitHubConfig, http: &HttpConfig, token: Option<String>) -> Result<Self> {
        Ok(Self {
            client: http.client()?,
            api_url: github.api_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
            candidates: github
                .candidates
                .iter()
                .map(|c| c.to_lowercase())
                .collect(),
            probe_delay: github.probe_delay(),
        })
    }

    fn contents_url(&self, owner: &str, project: &str, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_url, owner, project, path
        )
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let req = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json");
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// List the repository root.
    pub async fn list_root(
        &self,
        owner: &str,
        project: &str,
    ) -> Result<Vec<ContentEntry>, RampUpError> {
        let url = self.contents_url(owner, project, "");
        let response = self.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RampUpError::Transport(format!(
                "GitHub listing error {}: {}",
                status,
                body.trim()
            )));
        }

        response
            .json::<Vec<ContentEntry>>()
            .await
            .map_err(|e| RampUpError::Transport(format!("invalid GitHub listing: {}", e)))
    }

    /// Fetch one file's encoded content.
    async fn fetch_file(
        &self,
        owner: &str,
        project: &str,
        name: &str,
    ) -> Result<RawDocument, RampUpError> {
        let url = self.contents_url(owner, project, name);
        let response = self.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RampUpError::Transport(format!(
                "GitHub file error {} for {}",
                status, name
            )));
        }

        let file: FileContent = response
            .json()
            .await
            .map_err(|e| RampUpError::Transport(format!("invalid GitHub file payload: {}", e)))?;

        let content = file.content.unwrap_or_default();
        if content.trim().is_empty() {
            return Err(RampUpError::NotFound(format!("{} is empty", name)));
        }

        let encoding = match file.encoding.as_deref() {
            Some("base64") | None => Encoding::Base64,
            Some(_) => Encoding::Plain,
        };

        Ok(RawDocument {
            name: name.to_string(),
            content,
            encoding,
        })
    }
}

/// Pick listing entries matching the candidates, in candidate order.
///
/// Only files in the listing are considered. Each candidate maps to at most
/// one entry.
pub fn select_candidates<'a>(
    candidates: &[String],
    entries: &'a [ContentEntry],
) -> Vec<&'a ContentEntry> {
    candidates
        .iter()
        .filter_map(|candidate| {
            entries
                .iter()
                .find(|e| e.kind == "file" && e.name.to_lowercase() == *candidate)
        })
        .collect()
}

#[async_trait]
impl DocumentSource for GitHubSource {
    fn name(&self) -> &str {
        "github"
    }

    fn handles(&self, host: Host) -> bool {
        host == Host::Repository
    }

    async fn fetch(&self, identity: &ResourceIdentity) -> FetchOutcome {
        if identity.is_empty() {
            return FetchOutcome::not_found();
        }
        let owner = identity.owner.as_deref().unwrap_or_default();
        let project = identity.project.as_str();

        let entries = match self.list_root(owner, project).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(%identity, error = %e, "repository listing failed");
                return FetchOutcome::error(e, Vec::new());
            }
        };

        let selected = select_candidates(&self.candidates, &entries);
        tracing::debug!(
            %identity,
            entries = entries.len(),
            matches = selected.len(),
            "listed repository root"
        );

        let mut attempts = Vec::with_capacity(selected.len());

        for (i, entry) in selected.iter().enumerate() {
            match self.fetch_file(owner, project, &entry.name).await {
                Ok(doc) => {
                    tracing::debug!(%identity, file = %entry.name, "readme found");
                    attempts.push(FetchAttempt {
                        candidate_name: entry.name.clone(),
                        succeeded: true,
                        raw_content: Some(doc.content.clone()),
                    });
                    return FetchOutcome {
                        lookup: DocLookup::Found(doc),
                        attempts,
                    };
                }
                Err(e) => {
                    tracing::debug!(%identity, file = %entry.name, error = %e, "probe failed");
                    attempts.push(FetchAttempt {
                        candidate_name: entry.name.clone(),
                        succeeded: false,
                        raw_content: None,
                    });
                    if i + 1 < selected.len() && !self.probe_delay.is_zero() {
                        tokio::time::sleep(self.probe_delay).await;
                    }
                }
            }
        }

        FetchOutcome {
            lookup: DocLookup::NotFound,
            attempts,
        }
    }
}
