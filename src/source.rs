//! Document sources.
//!
//! A [`DocumentSource`] knows how to find the README-like document for one
//! kind of [`Host`]. Built-in sources:
//!
//! | Host | Source | Module |
//! |------|--------|--------|
//! | repository | [`GitHubSource`](crate::source_github::GitHubSource) | [`source_github`](crate::source_github) |
//! | registry | [`NpmSource`](crate::source_npm::NpmSource) | [`source_npm`](crate::source_npm) |
//!
//! Sources never return `Err`: every failure is reported through
//! [`DocLookup::Error`](crate::models::DocLookup) or
//! [`DocLookup::NotFound`](crate::models::DocLookup) so a failing fetch can
//! only ever lower a score to zero.

use async_trait::async_trait;

use crate::models::{FetchOutcome, Host, ResourceIdentity};

#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Short identifier used in logs (e.g. `"github"`).
    fn name(&self) -> &str;

    /// Whether this source can look up identities on `host`.
    fn handles(&self, host: Host) -> bool;

    /// Look up the documentation for `identity`.
    async fn fetch(&self, identity: &ResourceIdentity) -> FetchOutcome;
}

/// An ordered set of sources; the first one that handles a host wins.
#[derive(Default)]
pub struct SourceSet {
    sources: Vec<Box<dyn DocumentSource>>,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, source: Box<dyn DocumentSource>) {
        self.sources.push(source);
    }

    pub fn for_host(&self, host: Host) -> Option<&dyn DocumentSource> {
        self.sources
            .iter()
            .find(|s| s.handles(host))
            .map(|s| s.as_ref())
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Fetch through the matching source; no source means nothing found.
    pub async fn fetch(&self, identity: &ResourceIdentity) -> FetchOutcome {
        match self.for_host(identity.host) {
            Some(source) => {
                let outcome = source.fetch(identity).await;
                tracing::debug!(
                    source = source.name(),
                    %identity,
                    found = outcome.lookup.is_found(),
                    attempts = outcome.attempts.len(),
                    "fetch finished"
                );
                outcome
            }
            None => FetchOutcome::not_found(),
        }
    }
}
