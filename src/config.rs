//! TOML configuration.
//!
//! Every section is optional; a missing file section falls back to the
//! defaults below, so `Config::default()` is a complete working
//! configuration against the public GitHub, npm, and OpenAI endpoints.
//!
//! ```toml
//! [github]
//! api_url = "https://api.github.com"
//! candidates = ["readme", "readme.txt", "readme.md"]
//! probe_delay_ms = 1000
//!
//! [registry]
//! url = "https://registry.npmjs.org"
//!
//! [llm]
//! provider = "openai"
//! model = "gpt-4o-mini"
//!
//! [http]
//! timeout_secs = 20
//!
//! [credentials]
//! repo_token_env = "GITHUB_TOKEN"
//! llm_token_env = "OPENAI_API_KEY"
//!
//! [weights]
//! ramp_up = 1.0
//! ```
//!
//! Credentials themselves never live in the file. The binary resolves them
//! from the environment variables named in `[credentials]` and hands a
//! [`Credentials`] value to the library.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    /// Metric name → aggregation weight.
    #[serde(default = "default_weights")]
    pub weights: BTreeMap<String, f64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github: GitHubConfig::default(),
            registry: RegistryConfig::default(),
            llm: LlmConfig::default(),
            http: HttpConfig::default(),
            credentials: CredentialsConfig::default(),
            weights: default_weights(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GitHubConfig {
    #[serde(default = "default_github_api_url")]
    pub api_url: String,
    /// README file names in priority order, compared against lowercased listing names.
    #[serde(default = "default_candidates")]
    pub candidates: Vec<String>,
    /// Pause after an unsuccessful probe, before the next candidate.
    #[serde(default = "default_probe_delay_ms")]
    pub probe_delay_ms: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_api_url(),
            candidates: default_candidates(),
            probe_delay_ms: default_probe_delay_ms(),
        }
    }
}

impl GitHubConfig {
    pub fn probe_delay(&self) -> Duration {
        Duration::from_millis(self.probe_delay_ms)
    }
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}
fn default_candidates() -> Vec<String> {
    vec![
        "readme".to_string(),
        "readme.txt".to_string(),
        "readme.md".to_string(),
    ]
}
fn default_probe_delay_ms() -> u64 {
    1000
}

#[derive(Debug, Deserialize, Clone)]
pub struct RegistryConfig {
    #[serde(default = "default_registry_url")]
    pub url: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: default_registry_url(),
        }
    }
}

fn default_registry_url() -> String {
    "https://registry.npmjs.org".to_string()
}

/// Generative backend settings.
///
/// Sampling temperature is not configurable: requests always use `0.0` so
/// repeated scoring of the same document is reproducible. Unknown keys are
/// rejected, so a stray `temperature` fails to load instead of being ignored.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// First backoff step; doubles per retry.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl LlmConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_llm_provider() -> String {
    "openai".to_string()
}
fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_max_retries() -> u32 {
    2
}
fn default_retry_backoff_ms() -> u64 {
    1000
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build a reqwest client with the configured timeout and user agent.
    pub fn client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout())
            .user_agent(self.user_agent.clone())
            .build()
            .context("Failed to build HTTP client")
    }
}

fn default_timeout_secs() -> u64 {
    20
}
fn default_user_agent() -> String {
    format!("rampup/{}", env!("CARGO_PKG_VERSION"))
}

/// Names of the environment variables the binary reads credentials from.
#[derive(Debug, Deserialize, Clone)]
pub struct CredentialsConfig {
    #[serde(default = "default_repo_token_env")]
    pub repo_token_env: String,
    #[serde(default = "default_llm_token_env")]
    pub llm_token_env: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            repo_token_env: default_repo_token_env(),
            llm_token_env: default_llm_token_env(),
        }
    }
}

fn default_repo_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}
fn default_llm_token_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_weights() -> BTreeMap<String, f64> {
    BTreeMap::from([("ramp_up".to_string(), 1.0)])
}

/// Secrets supplied by the caller.
///
/// The library never reads process environment; whoever embeds it decides
/// where these come from.
#[derive(Clone, Default)]
pub struct Credentials {
    /// Bearer token for the repository host. Optional: anonymous requests work
    /// with a lower rate limit.
    pub repo_token: Option<String>,
    /// API key for the generative-text backend.
    pub llm_token: String,
}

impl Credentials {
    pub fn new(repo_token: Option<String>, llm_token: impl Into<String>) -> Self {
        Self {
            repo_token,
            llm_token: llm_token.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("repo_token", &self.repo_token.as_ref().map(|_| "<redacted>"))
            .field("llm_token", &"<redacted>")
            .finish()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

const MAX_RETRIES: u32 = 10;
const MAX_RETRY_BACKOFF_MS: u64 = 60_000;

pub fn validate(config: &Config) -> Result<()> {
    // Fetching
    if config.github.candidates.is_empty() {
        bail!("github.candidates must list at least one file name");
    }
    if config.github.candidates.iter().any(|c| c.trim().is_empty()) {
        bail!("github.candidates must not contain empty names");
    }
    if config.http.timeout_secs == 0 {
        bail!("http.timeout_secs must be > 0");
    }

    // Scoring
    if config.llm.max_retries > MAX_RETRIES {
        bail!("llm.max_retries must be <= {}", MAX_RETRIES);
    }
    if config.llm.retry_backoff_ms > MAX_RETRY_BACKOFF_MS {
        bail!("llm.retry_backoff_ms must be <= {}", MAX_RETRY_BACKOFF_MS);
    }
    if config.llm.model.trim().is_empty() {
        bail!("llm.model must not be empty");
    }
    match config.llm.provider.as_str() {
        "openai" | "disabled" => {}
        other => bail!(
            "Unknown llm provider: '{}'. Must be openai or disabled.",
            other
        ),
    }

    for (name, weight) in &config.weights {
        if !weight.is_finite() || *weight < 0.0 {
            bail!("weights.{} must be a finite, non-negative number", name);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        validate(&config).unwrap();
        assert_eq!(
            config.github.candidates,
            vec!["readme", "readme.txt", "readme.md"]
        );
        assert_eq!(config.github.probe_delay(), Duration::from_secs(1));
        assert_eq!(config.weights.get("ramp_up"), Some(&1.0));
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let file = write_config("");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.registry.url, "https://registry.npmjs.org");
        assert_eq!(config.http.timeout_secs, 20);
        assert_eq!(config.credentials.llm_token_env, "OPENAI_API_KEY");
    }

    #[test]
    fn test_partial_sections() {
        let file = write_config(
            r#"
[github]
api_url = "http://127.0.0.1:9999"
probe_delay_ms = 0

[llm]
provider = "disabled"

[weights]
ramp_up = 0.3
license = 0.7
"#,
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.github.api_url, "http://127.0.0.1:9999");
        assert_eq!(config.github.probe_delay(), Duration::ZERO);
        assert_eq!(config.github.candidates.len(), 3);
        assert!(!config.llm.is_enabled());
        assert_eq!(config.weights.len(), 2);
    }

    #[test]
    fn test_rejects_unknown_provider() {
        let file = write_config("[llm]\nprovider = \"magic\"\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("Unknown llm provider"));
    }

    #[test]
    fn test_rejects_empty_candidates() {
        let file = write_config("[github]\ncandidates = []\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_rejects_temperature_setting() {
        for value in ["1.5", "0.0"] {
            let file = write_config(&format!("[llm]\ntemperature = {}\n", value));
            let err = load_config(file.path()).unwrap_err();
            assert!(format!("{:#}", err).contains("temperature"), "{:#}", err);
        }
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let file = write_config("[http]\ntimeout_secs = 0\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_retry_settings_are_bounded() {
        let file = write_config("[llm]\nmax_retries = 10\nretry_backoff_ms = 60000\n");
        load_config(file.path()).unwrap();

        let file = write_config("[llm]\nmax_retries = 1000\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("max_retries"));

        let file = write_config("[llm]\nretry_backoff_ms = 86400000\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("retry_backoff_ms"));
    }

    #[test]
    fn test_rejects_negative_weight() {
        let file = write_config("[weights]\nramp_up = -1.0\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/rampup.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_credentials_debug_redacts() {
        let creds = Credentials::new(Some("ghp_secret".into()), "sk-secret");
        let shown = format!("{:?}", creds);
        assert!(!shown.contains("secret"));
        assert!(shown.contains("<redacted>"));
    }
}
