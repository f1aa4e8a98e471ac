//! # rampup CLI
//!
//! Scores how quickly a new developer can get productive with a package,
//! based on its README.
//!
//! ## Usage
//!
//! ```bash
//! rampup [--config ./config/rampup.toml] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rampup score <id>...` | Score one or more packages |
//! | `rampup score --net <id>...` | Weighted net score across registered metrics |
//! | `rampup locate <id>` | Show how an identifier is interpreted |
//! | `rampup fetch <id>` | Fetch and decode the README without scoring |
//!
//! ## Examples
//!
//! ```bash
//! # Score a GitHub repository and an npm package
//! GITHUB_TOKEN=ghp_... OPENAI_API_KEY=sk-... \
//!   rampup score https://github.com/expressjs/express left-pad
//!
//! # Machine-readable output
//! rampup score --json https://www.npmjs.com/package/lodash
//!
//! # Check which README would be used
//! rampup fetch https://github.com/tokio-rs/tokio
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `rampup=info`). Logs go to stderr.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use rampup::config::{self, Config, Credentials};
use rampup::score_cmd;

/// Rate how easy a package is to get started with, from its README.
#[derive(Parser)]
#[command(
    name = "rampup",
    about = "Rate how easy an open-source package is to get started with",
    version,
    long_about = "rampup locates a package's README on GitHub or the npm registry, \
    asks a generative-text model to grade it for onboarding quality, and reports a \
    score between 0 and 1. Any failure along the way scores 0."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Optional. Without it, built-in defaults are used (public GitHub API,
    /// public npm registry, OpenAI `gpt-4o-mini`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Score one or more packages.
    ///
    /// Identifiers may be GitHub repository URLs, npm package URLs, or bare
    /// npm package names. Packages are scored concurrently.
    Score {
        /// Package identifiers.
        #[arg(required = true)]
        identifiers: Vec<String>,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,

        /// Report the weighted net score from `[weights]`.
        #[arg(long)]
        net: bool,
    },

    /// Show how an identifier is parsed. Makes no network requests.
    Locate {
        identifier: String,

        /// Print the identity as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Fetch and decode a package's README without scoring it.
    ///
    /// Lists every candidate file probed, then prints the decoded text.
    Fetch { identifier: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rampup=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        // Parsing an identifier needs no config
        Commands::Locate { identifier, json } => {
            score_cmd::run_locate(&identifier, json)?;
        }
        Commands::Score {
            identifiers,
            json,
            net,
        } => {
            let cfg = load(cli.config.as_deref())?;
            let credentials = credentials_from_env(&cfg, true)?;
            score_cmd::run_score(&cfg, &credentials, &identifiers, json, net).await?;
        }
        Commands::Fetch { identifier } => {
            let cfg = load(cli.config.as_deref())?;
            let credentials = credentials_from_env(&cfg, false)?;
            score_cmd::run_fetch(&cfg, &credentials, &identifier).await?;
        }
    }

    Ok(())
}

fn load(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => config::load_config(path),
        None => Ok(Config::default()),
    }
}

/// Read credentials from the environment variables named in `[credentials]`.
///
/// The LLM key is required only when a command will call the backend.
fn credentials_from_env(cfg: &Config, needs_llm: bool) -> Result<Credentials> {
    let repo_token = read_env(&cfg.credentials.repo_token_env);
    let llm_token = read_env(&cfg.credentials.llm_token_env);

    if needs_llm && cfg.llm.is_enabled() && llm_token.is_none() {
        bail!(
            "{} environment variable not set (required for llm.provider = \"{}\")",
            cfg.credentials.llm_token_env,
            cfg.llm.provider
        );
    }

    Ok(Credentials::new(repo_token, llm_token.unwrap_or_default()))
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
