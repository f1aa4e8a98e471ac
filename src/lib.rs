//! # rampup
//!
//! Rates how easy it is for a new developer to get started with an
//! open-source package, by reading its README and asking an LLM.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌──────────┐   ┌──────────────┐
//! │ Locator  │──▶│   Sources    │──▶│ Decoder  │──▶│    Scorer    │
//! │ URL/name │   │ GitHub / npm │   │  base64  │   │ LLM, fail→0  │
//! └──────────┘   └──────────────┘   └──────────┘   └──────┬───────┘
//!                                                         ▼
//!                                               ┌──────────────────┐
//!                                               │  MetricRegistry  │
//!                                               │  weighted score  │
//!                                               └──────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rampup::config::{Config, Credentials};
//! use rampup::metric::score_ramp_up;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let credentials = Credentials::new(Some("ghp_...".into()), "sk-...");
//! let result = score_ramp_up("https://github.com/expressjs/express", &credentials, &Config::default()).await?;
//! println!("{:.2} in {:.0}ms", result.score, result.latency_millis);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and caller-supplied credentials |
//! | [`models`] | Core data types |
//! | [`error`] | Error taxonomy |
//! | [`locator`] | Identifier parsing |
//! | [`source`] | Document source trait |
//! | [`source_github`] | GitHub README source |
//! | [`source_npm`] | npm registry README source |
//! | [`decode`] | Transport decoding |
//! | [`llm`] | Generative-text backend abstraction |
//! | [`scorer`] | Ramp-up rubric and strict reply parsing |
//! | [`metric`] | Metric trait, ramp-up metric, weighted aggregation |
//! | [`score_cmd`] | CLI command implementations |

pub mod config;
pub mod decode;
pub mod error;
pub mod llm;
pub mod locator;
pub mod metric;
pub mod models;
pub mod score_cmd;
pub mod scorer;
pub mod source;
pub mod source_github;
pub mod source_npm;
