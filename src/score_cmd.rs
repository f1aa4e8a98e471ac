//! CLI command implementations.
//!
//! Each `run_*` function prints to stdout; logs go to stderr so the JSON
//! output stays parseable.

use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;

use crate::config::{Config, Credentials};
use crate::decode::decode;
use crate::llm::DisabledBackend;
use crate::locator::locate;
use crate::metric::{score_many, Metric, MetricRegistry, NetScore, RampUpMetric};
use crate::models::{DocLookup, ResourceIdentity, ScoreOutcome, ScoreResult};

/// One line of `rampup score` output.
#[derive(Debug, Serialize)]
pub struct ScoreRow {
    pub identifier: String,
    pub identity: ResourceIdentity,
    #[serde(flatten)]
    pub result: ScoreResult,
}

/// One line of `rampup score --net` output.
#[derive(Debug, Serialize)]
pub struct NetRow {
    pub identifier: String,
    pub identity: ResourceIdentity,
    #[serde(flatten)]
    pub net: NetScore,
}

/// Score each identifier concurrently and print the results.
pub async fn run_score(
    config: &Config,
    credentials: &Credentials,
    identifiers: &[String],
    json: bool,
    net: bool,
) -> Result<()> {
    let metric: Arc<dyn Metric> = Arc::new(RampUpMetric::from_config(config, credentials)?);

    if net {
        let mut registry = MetricRegistry::new();
        registry.register_weighted(metric, config);

        let mut rows = Vec::with_capacity(identifiers.len());
        for identifier in identifiers {
            let identity = locate(identifier);
            let net = registry.net_score(&identity).await;
            rows.push(NetRow {
                identifier: identifier.clone(),
                identity,
                net,
            });
        }
        print_net_rows(&rows, json)?;
        return Ok(());
    }

    let results = score_many(metric, identifiers).await;
    let rows: Vec<ScoreRow> = identifiers
        .iter()
        .zip(results)
        .map(|(identifier, result)| ScoreRow {
            identifier: identifier.clone(),
            identity: locate(identifier),
            result,
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{:<48} {:>6} {:>10}  OUTCOME", "PACKAGE", "SCORE", "LATENCY");
    for row in &rows {
        println!(
            "{:<48} {:>6.2} {:>8.0}ms  {}",
            row.identifier,
            row.result.score,
            row.result.latency_millis,
            outcome_label(&row.result.outcome)
        );
    }
    Ok(())
}

fn print_net_rows(rows: &[NetRow], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(rows)?);
        return Ok(());
    }

    for row in rows {
        println!(
            "{}  net {:.2}  ({:.0}ms)",
            row.identifier, row.net.net_score, row.net.latency_millis
        );
        for m in &row.net.metrics {
            println!(
                "  {:<12} {:.2}  weight {:.2}  {}",
                m.name,
                m.result.score,
                m.weight,
                outcome_label(&m.result.outcome)
            );
        }
    }
    Ok(())
}

fn outcome_label(outcome: &ScoreOutcome) -> String {
    match outcome {
        ScoreOutcome::Success => "scored".to_string(),
        ScoreOutcome::EmptyInput => "no readme".to_string(),
        ScoreOutcome::Failure(reason) => format!("failed: {}", reason),
    }
}

/// Print the parsed identity of an identifier.
pub fn run_locate(identifier: &str, json: bool) -> Result<()> {
    let identity = locate(identifier);

    if json {
        println!("{}", serde_json::to_string_pretty(&identity)?);
        return Ok(());
    }

    println!("host:    {}", identity.host);
    println!("owner:   {}", identity.owner.as_deref().unwrap_or("-"));
    println!(
        "project: {}",
        if identity.project.is_empty() {
            "-"
        } else {
            identity.project.as_str()
        }
    );
    Ok(())
}

/// Run the fetch and decode stages only, printing every probe and the document.
pub async fn run_fetch(config: &Config, credentials: &Credentials, identifier: &str) -> Result<()> {
    let metric = RampUpMetric::with_backend(config, credentials, Arc::new(DisabledBackend))?;
    let identity = locate(identifier);
    let outcome = metric.sources().fetch(&identity).await;

    println!("--- Identity ---");
    println!("{}", identity);
    println!();

    println!("--- Attempts ({}) ---", outcome.attempts.len());
    for attempt in &outcome.attempts {
        println!(
            "{:<20} {}",
            attempt.candidate_name,
            if attempt.succeeded { "ok" } else { "failed" }
        );
    }
    println!();

    match outcome.lookup {
        DocLookup::Found(doc) => match decode(&doc) {
            Ok(text) => {
                println!("--- {} ---", doc.name);
                println!("{}", text);
            }
            Err(e) => println!("--- {} (undecodable: {}) ---", doc.name, e),
        },
        DocLookup::NotFound => println!("--- No readme found ---"),
        DocLookup::Error(e) => println!("--- Fetch failed: {} ---", e),
    }

    Ok(())
}
