//! Package metrics and their aggregation.
//!
//! A [`Metric`] rates one aspect of a package on `[0, 1]`. The crate ships
//! one, [`RampUpMetric`], which runs the whole fetch → decode → score
//! pipeline. Sibling metrics (license, bus factor, responsiveness, ...) plug
//! into the same trait and are combined by a [`MetricRegistry`]:
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │              MetricRegistry              │
//! │  ┌─────────┐ ┌─────────┐ ┌────────────┐  │
//! │  │ ramp_up │ │ license │ │  custom    │  │
//! │  │  w=0.3  │ │  w=0.7  │ │  w=...     │  │
//! │  └─────────┘ └─────────┘ └────────────┘  │
//! └──────────────┬───────────────────────────┘
//!                ▼
//!        net_score() → weighted mean in [0, 1]
//! ```
//!
//! Metrics never fail. A metric that cannot compute its signal reports
//! `0.0`, so one broken signal cannot abort the overall evaluation.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

use crate::config::{validate, Config, Credentials};
use crate::decode::decode;
use crate::error::RampUpError;
use crate::llm::{create_backend, CompletionBackend};
use crate::locator::locate;
use crate::models::{clamp_unit, DocLookup, ResourceIdentity, ScoreResult};
use crate::scorer::RampUpScorer;
use crate::source::SourceSet;
use crate::source_github::GitHubSource;
use crate::source_npm::NpmSource;

/// One signal in a package evaluation.
#[async_trait]
pub trait Metric: Send + Sync {
    /// Stable identifier, also the key in `[weights]` (e.g. `"ramp_up"`).
    fn name(&self) -> &str;

    /// Evaluate the package. Must not panic or fail; failures score `0.0`.
    async fn evaluate(&self, identity: &ResourceIdentity) -> ScoreResult;
}

// ═══════════════════════════════════════════════════════════════════════
// Ramp-up metric
// ═══════════════════════════════════════════════════════════════════════

/// Documentation ramp-up metric: locate → fetch → decode → score.
pub struct RampUpMetric {
    sources: SourceSet,
    scorer: RampUpScorer,
}

impl RampUpMetric {
    /// Build with the built-in GitHub and npm sources and the configured backend.
    pub fn from_config(config: &Config, credentials: &Credentials) -> Result<Self> {
        validate(config)?;
        let backend = create_backend(&config.llm, &config.http, credentials)?;
        Self::with_backend(config, credentials, backend)
    }

    /// Like [`from_config`](Self::from_config) with an explicit backend.
    pub fn with_backend(
        config: &Config,
        credentials: &Credentials,
        backend: Arc<dyn CompletionBackend>,
    ) -> Result<Self> {
        let mut sources = SourceSet::new();
        sources.register(Box::new(GitHubSource::new(
            &config.github,
            &config.http,
            credentials.repo_token.clone(),
        )?));
        sources.register(Box::new(NpmSource::new(&config.registry, &config.http)?));

        Ok(Self::new(sources, RampUpScorer::new(backend)))
    }

    pub fn new(sources: SourceSet, scorer: RampUpScorer) -> Self {
        Self { sources, scorer }
    }

    pub fn sources(&self) -> &SourceSet {
        &self.sources
    }

    /// Locate, then evaluate.
    pub async fn evaluate_identifier(&self, identifier: &str) -> ScoreResult {
        let identity = locate(identifier);
        self.evaluate(&identity).await
    }

    /// Fetch and decode the document for `identity`.
    ///
    /// `Ok(None)` means nothing usable was found; a document that fails to
    /// decode counts as not found. `Err` is a transport failure, which
    /// [`evaluate`](Metric::evaluate) also scores as empty input.
    pub async fn document_text(
        &self,
        identity: &ResourceIdentity,
    ) -> Result<Option<String>, RampUpError> {
        let outcome = self.sources.fetch(identity).await;
        match outcome.lookup {
            DocLookup::Found(doc) => match decode(&doc) {
                Ok(text) => Ok(Some(text)),
                Err(e) => {
                    tracing::warn!(%identity, file = %doc.name, error = %e, "readme could not be decoded");
                    Ok(None)
                }
            },
            DocLookup::NotFound => Ok(None),
            DocLookup::Error(e) => Err(e),
        }
    }
}

#[async_trait]
impl Metric for RampUpMetric {
    fn name(&self) -> &str {
        "ramp_up"
    }

    async fn evaluate(&self, identity: &ResourceIdentity) -> ScoreResult {
        let start = Instant::now();

        let mut result = match self.document_text(identity).await {
            Ok(Some(text)) => self.scorer.score_text(&text).await,
            Ok(None) => {
                tracing::debug!(%identity, "no readme to score");
                ScoreResult::empty(0.0)
            }
            // The source already logged the failure at warn level
            Err(e) => {
                tracing::debug!(%identity, error = %e, "fetch failed, scoring empty content");
                ScoreResult::empty(0.0)
            }
        };

        result.latency_millis = start.elapsed().as_secs_f64() * 1000.0;
        tracing::info!(
            %identity,
            model = self.scorer.model_name(),
            score = result.score,
            latency_ms = result.latency_millis,
            "ramp-up scored"
        );
        result
    }
}

/// Score one identifier end to end.
///
/// Only construction problems (invalid configuration, HTTP client build
/// failure) return `Err`. Missing documentation, network outages, and
/// malformed model output all yield `Ok` with a `0.0` score.
pub async fn score_ramp_up(
    identifier: &str,
    credentials: &Credentials,
    config: &Config,
) -> Result<ScoreResult> {
    let metric = RampUpMetric::from_config(config, credentials)?;
    Ok(metric.evaluate_identifier(identifier).await)
}

/// Evaluate many identifiers concurrently. Results are in input order.
pub async fn score_many(metric: Arc<dyn Metric>, identifiers: &[String]) -> Vec<ScoreResult> {
    let mut set = JoinSet::new();
    for (index, identifier) in identifiers.iter().enumerate() {
        let metric = Arc::clone(&metric);
        let identity = locate(identifier);
        set.spawn(async move { (index, metric.evaluate(&identity).await) });
    }

    let mut results: Vec<Option<ScoreResult>> = vec![None; identifiers.len()];
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((index, result)) => results[index] = Some(result),
            Err(e) => tracing::warn!(error = %e, "scoring task did not complete"),
        }
    }

    results
        .into_iter()
        .map(|r| r.unwrap_or_else(|| ScoreResult::failure("scoring task aborted", 0.0)))
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════
// Aggregation
// ═══════════════════════════════════════════════════════════════════════

/// One metric's contribution to a [`NetScore`].
#[derive(Debug, Clone, Serialize)]
pub struct MetricScore {
    pub name: String,
    pub weight: f64,
    pub result: ScoreResult,
}

/// Weighted combination of every registered metric.
#[derive(Debug, Clone, Serialize)]
pub struct NetScore {
    pub net_score: f64,
    pub latency_millis: f64,
    pub metrics: Vec<MetricScore>,
}

impl NetScore {
    pub fn metric(&self, name: &str) -> Option<&MetricScore> {
        self.metrics.iter().find(|m| m.name == name)
    }
}

/// Registry of weighted metrics.
#[derive(Default)]
pub struct MetricRegistry {
    metrics: Vec<(Arc<dyn Metric>, f64)>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a metric. Negative or non-finite weights count as zero.
    pub fn register(&mut self, metric: Arc<dyn Metric>, weight: f64) {
        let weight = if weight.is_finite() { weight.max(0.0) } else { 0.0 };
        self.metrics.push((metric, weight));
    }

    /// Register a metric with the weight configured under its name.
    /// Metrics without a configured weight get `0.0`.
    pub fn register_weighted(&mut self, metric: Arc<dyn Metric>, config: &Config) {
        let weight = config.weights.get(metric.name()).copied().unwrap_or(0.0);
        self.register(metric, weight);
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Evaluate every metric concurrently and combine them.
    ///
    /// The net score is `Σ wᵢ·sᵢ / Σ wᵢ`, clamped to `[0, 1]`; with zero
    /// total weight it is `0.0`. Latency is the wall time of the whole
    /// evaluation.
    pub async fn net_score(&self, identity: &ResourceIdentity) -> NetScore {
        let start = Instant::now();

        let mut set = JoinSet::new();
        for (index, (metric, _)) in self.metrics.iter().enumerate() {
            let metric = Arc::clone(metric);
            let identity = identity.clone();
            set.spawn(async move { (index, metric.evaluate(&identity).await) });
        }

        let mut results: Vec<Option<ScoreResult>> = vec![None; self.metrics.len()];
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => tracing::warn!(error = %e, "metric task did not complete"),
            }
        }

        let metrics: Vec<MetricScore> = self
            .metrics
            .iter()
            .zip(results)
            .map(|((metric, weight), result)| MetricScore {
                name: metric.name().to_string(),
                weight: *weight,
                result: result.unwrap_or_else(|| ScoreResult::failure("metric task aborted", 0.0)),
            })
            .collect();

        NetScore {
            net_score: weighted_mean(&metrics),
            latency_millis: start.elapsed().as_secs_f64() * 1000.0,
            metrics,
        }
    }
}

fn weighted_mean(metrics: &[MetricScore]) -> f64 {
    let total_weight: f64 = metrics.iter().map(|m| m.weight).sum();
    if total_weight <= 0.0 {
        return 0.0;
    }
    let weighted: f64 = metrics.iter().map(|m| m.weight * m.result.score).sum();
    clamp_unit(weighted / total_weight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Host, ScoreOutcome};

    struct FixedMetric {
        name: &'static str,
        score: f64,
    }

    #[async_trait]
    impl Metric for FixedMetric {
        fn name(&self) -> &str {
            self.name
        }

        async fn evaluate(&self, _identity: &ResourceIdentity) -> ScoreResult {
            ScoreResult::success(self.score, 1.0)
        }
    }

    /// Scores by host so ordering of concurrent results is observable.
    struct HostMetric;

    #[async_trait]
    impl Metric for HostMetric {
        fn name(&self) -> &str {
            "host"
        }

        async fn evaluate(&self, identity: &ResourceIdentity) -> ScoreResult {
            match identity.host {
                Host::Repository => {
                    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                    ScoreResult::success(1.0, 20.0)
                }
                Host::Registry => ScoreResult::success(0.5, 0.0),
                Host::Unrecognized => ScoreResult::empty(0.0),
            }
        }
    }

    fn fixed(name: &'static str, score: f64) -> Arc<dyn Metric> {
        Arc::new(FixedMetric { name, score })
    }

    #[tokio::test]
    async fn test_net_score_weighted_mean() {
        let mut registry = MetricRegistry::new();
        registry.register(fixed("ramp_up", 0.8), 0.3);
        registry.register(fixed("license", 1.0), 0.5);
        registry.register(fixed("bus_factor", 0.2), 0.2);
        assert_eq!(registry.len(), 3);

        let net = registry
            .net_score(&ResourceIdentity::registry("widget"))
            .await;
        let expected = 0.3 * 0.8 + 0.5 * 1.0 + 0.2 * 0.2;
        assert!((net.net_score - expected).abs() < 1e-9);
        assert_eq!(net.metrics.len(), 3);
        assert_eq!(net.metrics[0].name, "ramp_up");
        assert_eq!(net.metric("license").unwrap().weight, 0.5);
    }

    #[tokio::test]
    async fn test_net_score_normalizes_weights() {
        let mut registry = MetricRegistry::new();
        registry.register(fixed("a", 1.0), 2.0);
        registry.register(fixed("b", 0.0), 2.0);
        let net = registry.net_score(&ResourceIdentity::registry("x")).await;
        assert!((net.net_score - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_net_score_zero_weight_and_empty() {
        let empty = MetricRegistry::new();
        assert!(empty.is_empty());
        let net = empty.net_score(&ResourceIdentity::registry("x")).await;
        assert_eq!(net.net_score, 0.0);

        let mut registry = MetricRegistry::new();
        registry.register(fixed("a", 1.0), 0.0);
        registry.register(fixed("b", 1.0), -3.0);
        registry.register(fixed("c", 1.0), f64::NAN);
        let net = registry.net_score(&ResourceIdentity::registry("x")).await;
        assert_eq!(net.net_score, 0.0);
        assert!(net.metrics.iter().all(|m| m.weight == 0.0));
    }

    #[tokio::test]
    async fn test_register_weighted_from_config() {
        let mut config = Config::default();
        config.weights.insert("license".to_string(), 0.7);

        let mut registry = MetricRegistry::new();
        registry.register_weighted(fixed("ramp_up", 1.0), &config);
        registry.register_weighted(fixed("license", 0.0), &config);
        registry.register_weighted(fixed("unweighted", 1.0), &config);

        let net = registry.net_score(&ResourceIdentity::registry("x")).await;
        assert_eq!(net.metric("ramp_up").unwrap().weight, 1.0);
        assert_eq!(net.metric("unweighted").unwrap().weight, 0.0);
        assert!((net.net_score - 1.0 / 1.7).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_score_many_preserves_input_order() {
        let metric: Arc<dyn Metric> = Arc::new(HostMetric);
        let identifiers = vec![
            "https://github.com/acme/widget".to_string(),
            "left-pad".to_string(),
            "not a package".to_string(),
        ];
        let results = score_many(metric, &identifiers).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].score, 1.0);
        assert_eq!(results[1].score, 0.5);
        assert_eq!(results[2].outcome, ScoreOutcome::EmptyInput);
        assert_eq!(results[0].outcome, ScoreOutcome::Success);
    }
}
