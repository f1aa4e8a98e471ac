//! npm registry README source.
//!
//! The registry embeds the README as plain text in the package metadata
//! document (`GET {registry}/{package}` → `{ "readme": "..." }`), so a single
//! unauthenticated request is enough. Packages published without a README
//! carry a placeholder string instead, which counts as not found.

use anyhow::Result;
use async_trait::async_trait;

use crate::config::{HttpConfig, RegistryConfig};
use crate::error::RampUpError;
use crate::models::{
    DocLookup, Encoding, FetchAttempt, FetchOutcome, Host, RawDocument, ResourceIdentity,
};
use crate::source::DocumentSource;

const NO_README_PLACEHOLDER: &str = "ERROR: No README data found!";

pub struct NpmSource {
    client: reqwest::Client,
    registry_url: String,
}

impl NpmSource {
    pub fn new(registry: &RegistryConfig, http: &HttpConfig) -> Result<Self> {
        Ok(Self {
            client: http.client()?,
            registry_url: registry.url.trim_end_matches('/').to_string(),
        })
    }

    /// Metadata URL for a package; scoped names keep `@` and encode the slash.
    pub fn package_url(&self, package: &str) -> String {
        format!("{}/{}", self.registry_url, package.replace('/', "%2F"))
    }

    async fn fetch_metadata(&self, package: &str) -> Result<serde_json::Value, RampUpError> {
        let response = self.client.get(self.package_url(package)).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RampUpError::Transport(format!(
                "npm registry error {} for {}",
                status, package
            )));
        }

        response
            .json()
            .await
            .map_err(|e| RampUpError::Transport(format!("invalid registry metadata: {}", e)))
    }
}

/// Pull the embedded README out of registry metadata.
pub fn extract_readme(metadata: &serde_json::Value) -> Option<&str> {
    metadata
        .get("readme")
        .and_then(|r| r.as_str())
        .map(str::trim)
        .filter(|r| !r.is_empty() && *r != NO_README_PLACEHOLDER)
}

#[async_trait]
impl DocumentSource for NpmSource {
    fn name(&self) -> &str {
        "npm"
    }

    fn handles(&self, host: Host) -> bool {
        host == Host::Registry
    }

    async fn fetch(&self, identity: &ResourceIdentity) -> FetchOutcome {
        if identity.is_empty() {
            return FetchOutcome::not_found();
        }
        let package = identity.project.as_str();

        let metadata = match self.fetch_metadata(package).await {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(%identity, error = %e, "registry metadata fetch failed");
                let attempt = FetchAttempt {
                    candidate_name: "readme".to_string(),
                    succeeded: false,
                    raw_content: None,
                };
                return FetchOutcome::error(e, vec![attempt]);
            }
        };

        match extract_readme(&metadata) {
            Some(readme) => {
                tracing::debug!(%identity, bytes = readme.len(), "registry readme found");
                FetchOutcome {
                    attempts: vec![FetchAttempt {
                        candidate_name: "readme".to_string(),
                        succeeded: true,
                        raw_content: Some(readme.to_string()),
                    }],
                    lookup: DocLookup::Found(RawDocument {
                        name: "readme".to_string(),
                        content: readme.to_string(),
                        encoding: Encoding::Plain,
                    }),
                }
            }
            None => {
                tracing::debug!(%identity, "registry metadata has no readme");
                FetchOutcome {
                    lookup: DocLookup::NotFound,
                    attempts: vec![FetchAttempt {
                        candidate_name: "readme".to_string(),
                        succeeded: false,
                        raw_content: None,
                    }],
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_readme() {
        let meta = json!({ "name": "widget", "readme": "# Widget\n\nUsage..." });
        assert_eq!(extract_readme(&meta), Some("# Widget\n\nUsage..."));
    }

    #[test]
    fn test_extract_readme_missing_or_placeholder() {
        assert_eq!(extract_readme(&json!({ "name": "widget" })), None);
        assert_eq!(extract_readme(&json!({ "readme": "   " })), None);
        assert_eq!(extract_readme(&json!({ "readme": 42 })), None);
        assert_eq!(
            extract_readme(&json!({ "readme": "ERROR: No README data found!" })),
            None
        );
    }

    #[test]
    fn test_package_url_encodes_scope() {
        let source = NpmSource::new(
            &RegistryConfig {
                url: "https://registry.npmjs.org/".into(),
            },
            &HttpConfig::default(),
        )
        .unwrap();
        assert_eq!(
            source.package_url("express"),
            "https://registry.npmjs.org/express"
        );
        assert_eq!(
            source.package_url("@types/node"),
            "https://registry.npmjs.org/@types%2Fnode"
        );
    }
}
