//! Configuration management.
//!
//! Settings come from an optional TOML file layered under environment
//! variables prefixed with `PUBMED_AFFILIATIONS_` (nested keys separated by
//! `__`, e.g. `PUBMED_AFFILIATIONS_PUBMED__MAX_RESULTS=20`).
//!
//! # Configuration File Format
//!
//! ```toml
//! [api_keys]
//! openai = "sk-..."
//!
//! [pubmed]
//! max_results = 50
//! api_key = "ncbi-key"
//! email = "me@example.org"
//!
//! [classifier]
//! base_url = "https://api.openai.com/v1"
//! model = "gpt-4"
//! cache = true
//!
//! [http]
//! timeout_secs = 30
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the project-local configuration file
pub const LOCAL_CONFIG_FILE: &str = "pubmed-affiliations.toml";

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "PUBMED_AFFILIATIONS";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeys,

    /// PubMed E-utilities settings
    #[serde(default)]
    pub pubmed: PubMedConfig,

    /// Affiliation classifier settings
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,
}

/// API keys for external services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeys {
    /// Credential for the chat-completion service
    #[serde(default = "default_openai_key")]
    pub openai: Option<String>,
}

impl Default for ApiKeys {
    fn default() -> Self {
        Self {
            openai: default_openai_key(),
        }
    }
}

fn default_openai_key() -> Option<String> {
    std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty())
}

/// PubMed E-utilities configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PubMedConfig {
    /// ESearch endpoint
    #[serde(default = "default_esearch_url")]
    pub esearch_url: String,

    /// EFetch endpoint
    #[serde(default = "default_efetch_url")]
    pub efetch_url: String,

    /// Maximum number of identifiers requested from ESearch
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// NCBI API key (optional, raises the NCBI rate ceiling)
    #[serde(default = "default_ncbi_key")]
    pub api_key: Option<String>,

    /// Contact email sent to NCBI (optional)
    #[serde(default)]
    pub email: Option<String>,

    /// Tool name sent to NCBI (optional)
    #[serde(default)]
    pub tool: Option<String>,
}

impl Default for PubMedConfig {
    fn default() -> Self {
        Self {
            esearch_url: default_esearch_url(),
            efetch_url: default_efetch_url(),
            max_results: default_max_results(),
            api_key: default_ncbi_key(),
            email: None,
            tool: None,
        }
    }
}

fn default_esearch_url() -> String {
    "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi".to_string()
}

fn default_efetch_url() -> String {
    "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi".to_string()
}

fn default_max_results() -> usize {
    50
}

fn default_ncbi_key() -> Option<String> {
    std::env::var("NCBI_API_KEY").ok().filter(|k| !k.is_empty())
}

/// Affiliation classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_classifier_url")]
    pub base_url: String,

    /// Chat model used for classification
    #[serde(default = "default_model")]
    pub model: String,

    /// System instruction sent before each affiliation
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Memoise labels by affiliation text for the duration of a run
    #[serde(default = "default_true")]
    pub cache: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            base_url: default_classifier_url(),
            model: default_model(),
            system_prompt: default_system_prompt(),
            cache: true,
        }
    }
}

fn default_classifier_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4".to_string()
}

fn default_system_prompt() -> String {
    "Classify the following affiliation as 'academic' or 'corporate'.".to_string()
}

fn default_true() -> bool {
    true
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// User agent override
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    crate::utils::DEFAULT_USER_AGENT.to_string()
}

/// Load configuration from an optional file plus process environment
pub fn load_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    build_config(path, environment())
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn build_config(
    path: Option<&Path>,
    env: config::Environment,
) -> Result<Config, config::ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder.add_source(env).build()?;
    settings.try_deserialize()
}

/// Find a configuration file in the default locations
///
/// Checks `./pubmed-affiliations.toml` first, then
/// `<config dir>/pubmed-affiliations/config.toml`.
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("pubmed-affiliations").join("config.toml"))
        .filter(|path| path.is_file())
}
