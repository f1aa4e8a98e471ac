//! Core data types that flow through the fetch → decode → score pipeline.

use serde::Serialize;

use crate::error::RampUpError;

/// Where a package's documentation lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Host {
    /// A version-controlled repository on github.com.
    Repository,
    /// A package on the npm registry.
    Registry,
    /// The identifier matched neither known host.
    Unrecognized,
}

impl std::fmt::Display for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Host::Repository => "repository",
            Host::Registry => "registry",
            Host::Unrecognized => "unrecognized",
        };
        f.write_str(label)
    }
}

/// Parsed identity of a package. Repository identities carry an owner;
/// registry identities carry only the package name in `project`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceIdentity {
    pub host: Host,
    pub owner: Option<String>,
    pub project: String,
}

impl ResourceIdentity {
    pub fn repository(owner: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            host: Host::Repository,
            owner: Some(owner.into()),
            project: project.into(),
        }
    }

    pub fn registry(package: impl Into<String>) -> Self {
        Self {
            host: Host::Registry,
            owner: None,
            project: package.into(),
        }
    }

    pub fn unrecognized() -> Self {
        Self {
            host: Host::Unrecognized,
            owner: None,
            project: String::new(),
        }
    }

    /// True when there is nothing to look up. Downstream treats this as
    /// "no documentation found", never as an error.
    pub fn is_empty(&self) -> bool {
        match self.host {
            Host::Repository => {
                self.project.is_empty() || self.owner.as_deref().map_or(true, str::is_empty)
            }
            Host::Registry => self.project.is_empty(),
            Host::Unrecognized => true,
        }
    }
}

impl std::fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.owner {
            Some(owner) => write!(f, "{}:{}/{}", self.host, owner, self.project),
            None => write!(f, "{}:{}", self.host, self.project),
        }
    }
}

/// Transport encoding of a fetched document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    Base64,
    Plain,
}

/// A document as returned by a remote API, before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    /// File name or field the content came from (e.g. `README.md`, `readme`).
    pub name: String,
    pub content: String,
    pub encoding: Encoding,
}

/// One probe of one candidate file name.
#[derive(Debug, Clone, Serialize)]
pub struct FetchAttempt {
    pub candidate_name: String,
    pub succeeded: bool,
    #[serde(skip_serializing)]
    pub raw_content: Option<String>,
}

/// Result of looking for a document.
#[derive(Debug)]
pub enum DocLookup {
    Found(RawDocument),
    NotFound,
    Error(RampUpError),
}

impl DocLookup {
    pub fn is_found(&self) -> bool {
        matches!(self, DocLookup::Found(_))
    }
}

/// What a document source did, including every probe it made.
#[derive(Debug)]
pub struct FetchOutcome {
    pub lookup: DocLookup,
    pub attempts: Vec<FetchAttempt>,
}

impl FetchOutcome {
    pub fn not_found() -> Self {
        Self {
            lookup: DocLookup::NotFound,
            attempts: Vec::new(),
        }
    }

    pub fn error(err: RampUpError, attempts: Vec<FetchAttempt>) -> Self {
        Self {
            lookup: DocLookup::Error(err),
            attempts,
        }
    }
}

/// How a scoring call ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum ScoreOutcome {
    /// The backend produced a valid score.
    Success,
    /// No document text; the backend was not called. Covers a missing
    /// README, an undecodable one, and a fetch that failed in transport.
    EmptyInput,
    /// The backend was called and errored or replied with something
    /// unparseable, or the scoring task itself died; the score fell back
    /// to zero.
    Failure(String),
}

/// A normalized score plus how long it took to produce.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    /// Always within `[0.0, 1.0]`.
    pub score: f64,
    pub latency_millis: f64,
    pub outcome: ScoreOutcome,
}

impl ScoreResult {
    pub fn success(score: f64, latency_millis: f64) -> Self {
        Self {
            score: clamp_unit(score),
            latency_millis,
            outcome: ScoreOutcome::Success,
        }
    }

    pub fn empty(latency_millis: f64) -> Self {
        Self {
            score: 0.0,
            latency_millis,
            outcome: ScoreOutcome::EmptyInput,
        }
    }

    pub fn failure(reason: impl Into<String>, latency_millis: f64) -> Self {
        Self {
            score: 0.0,
            latency_millis,
            outcome: ScoreOutcome::Failure(reason.into()),
        }
    }
}

/// Clamp into `[0, 1]`; non-finite values become `0.0`.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
