//! Configuration with layered resolution using figment.
//!
//! Resolution order (highest priority last):
//! 1. User config: `~/.config/graforest/config.toml` (XDG) or platform config dir
//! 2. Project config: `.graforest.toml`
//! 3. Environment variables: `GRAFOREST_*`
//!
//! # Intended Usage
//!
//! **Global config** (`~/.config/graforest/config.toml`):
//! ```toml
//! [gateway]
//! key = "gf_sk_..."
//!
//! [provision]
//! url = "https://logicblok.rationalbloks.com"
//! key = "rb_sk_..."
//! ```
//!
//! Everything has a default except the two keys, so a bare environment with
//! `GRAFOREST_GATEWAY_KEY` and `GRAFOREST_PROVISION_KEY` set is enough to run.
//!
//! The `[policy]` section holds the gateway's tunable limits. The defaults
//! below are the documented contract; deployments only override them when a
//! backend needs looser deadlines.

use std::ops::Deref;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

/// Boxed wrapper for figment::Error to reduce Result size on the stack.
#[derive(Debug)]
pub struct ConfigError(Box<figment::Error>);

impl Deref for ConfigError {
    type Target = figment::Error;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self(Box::new(err))
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub graph: GraphApiConfig,
    #[serde(default)]
    pub provision: ProvisionConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
}

/// Gateway-level settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayConfig {
    /// Graforest API key (`gf_sk_...`). Required for the stdio transport and
    /// for authenticating callers of the HTTP transport.
    #[serde(default)]
    pub key: Option<String>,
}

/// Graph API endpoint configuration.
///
/// URL templates contain a `{project}` placeholder replaced with the
/// normalized project code (lowercased, underscores to dashes).
#[derive(Debug, Clone, Deserialize)]
pub struct GraphApiConfig {
    /// Staging Graph API URL template.
    #[serde(default = "default_staging_url")]
    pub staging: String,
    /// Production Graph API URL template.
    #[serde(default = "default_production_url")]
    pub production: String,
}

impl Default for GraphApiConfig {
    fn default() -> Self {
        Self {
            staging: default_staging_url(),
            production: default_production_url(),
        }
    }
}

fn default_staging_url() -> String {
    "https://{project}-staging.rationalbloks.com".to_string()
}

fn default_production_url() -> String {
    "https://{project}.rationalbloks.com".to_string()
}

/// Provisioning API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProvisionConfig {
    /// Base URL of the provisioning gateway.
    #[serde(default = "default_provision_url")]
    pub url: String,
    /// Service account key (`rb_sk_...`). Individual gateway users never see
    /// this key; it is only forwarded to the provisioning API.
    #[serde(default)]
    pub key: Option<String>,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            url: default_provision_url(),
            key: None,
        }
    }
}

fn default_provision_url() -> String {
    "https://logicblok.rationalbloks.com".to_string()
}

/// Tunable request-mediation policy.
///
/// Defaults: 3 read attempts with 250 ms exponential backoff, 60 s graph
/// request deadline (120 s provisioning, 30 s fetch), pages of 1..=500
/// records (default 50), traversal depth 1..=5 (default 3), provisioning
/// polled every 3 s for at most 300 s, ingestion text 50..=500_000 chars.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    /// Total attempts for idempotent read operations (1 = no retry).
    #[serde(default = "default_read_retries")]
    pub read_retries: u32,
    /// Base backoff between retry attempts, doubled per attempt.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// Deadline for a single Graph API request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Deadline for a single provisioning API request.
    #[serde(default = "default_provision_timeout_secs")]
    pub provision_timeout_secs: u64,
    /// Deadline for a URL fetch.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// Interval between provisioning job status polls.
    #[serde(default = "default_provision_poll_secs")]
    pub provision_poll_secs: u64,
    /// Upper bound on the whole provisioning workflow.
    #[serde(default = "default_provision_wait_secs")]
    pub provision_wait_secs: u64,
    /// Largest accepted `limit` for paginated listings.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
    /// `limit` applied when the caller omits one.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    /// Largest accepted traversal depth.
    #[serde(default = "default_max_traversal_depth")]
    pub max_traversal_depth: u32,
    /// Depth applied when the caller omits one.
    #[serde(default = "default_traversal_depth")]
    pub default_traversal_depth: u32,
    /// Largest accepted ingestion text, in characters.
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
    /// Smallest useful ingestion text, in characters.
    #[serde(default = "default_min_content_chars")]
    pub min_content_chars: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            read_retries: default_read_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            provision_timeout_secs: default_provision_timeout_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            provision_poll_secs: default_provision_poll_secs(),
            provision_wait_secs: default_provision_wait_secs(),
            max_page_size: default_max_page_size(),
            default_page_size: default_page_size(),
            max_traversal_depth: default_max_traversal_depth(),
            default_traversal_depth: default_traversal_depth(),
            max_content_chars: default_max_content_chars(),
            min_content_chars: default_min_content_chars(),
        }
    }
}

fn default_read_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    250
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_provision_timeout_secs() -> u64 {
    120
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_provision_poll_secs() -> u64 {
    3
}

fn default_provision_wait_secs() -> u64 {
    300
}

fn default_max_page_size() -> u32 {
    500
}

fn default_page_size() -> u32 {
    50
}

fn default_max_traversal_depth() -> u32 {
    5
}

fn default_traversal_depth() -> u32 {
    3
}

fn default_max_content_chars() -> usize {
    500_000
}

fn default_min_content_chars() -> usize {
    50
}

impl Config {
    /// Load config with layered resolution (user → project → env).
    pub fn load() -> Result<Self, ConfigError> {
        let user_config = Self::user_config_path();

        Figment::new()
            // Layer 1: User config (lowest priority)
            .merge(Toml::file(user_config))
            // Layer 2: Project config
            .merge(Toml::file(".graforest.toml"))
            // Layer 3: Environment variables (highest priority)
            .merge(Env::prefixed("GRAFOREST_").split("_"))
            .extract()
            .map_err(ConfigError::from)
    }

    /// User config path: ~/.config/graforest/config.toml (XDG) or platform config dir.
    fn user_config_path() -> std::path::PathBuf {
        // Prefer XDG config location (~/.config) on all platforms
        if let Some(home) = dirs::home_dir() {
            let xdg_path = home.join(".config").join("graforest").join("config.toml");
            if xdg_path.exists() {
                return xdg_path;
            }
        }
        // Fall back to platform-specific config dir
        dirs::config_dir()
            .map(|p| p.join("graforest").join("config.toml"))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_complete() {
        let config = Config::default();
        assert_eq!(config.policy.read_retries, 3);
        assert_eq!(config.policy.max_page_size, 500);
        assert_eq!(config.policy.max_traversal_depth, 5);
        assert_eq!(config.policy.max_content_chars, 500_000);
        assert!(config.gateway.key.is_none());
        assert!(config.graph.staging.contains("{project}"));
    }

    #[test]
    fn test_extract_from_empty_figment() {
        let config: Config = Figment::new().extract().expect("defaults should apply");
        assert_eq!(config.policy.default_page_size, 50);
        assert_eq!(config.provision.url, "https://logicblok.rationalbloks.com");
    }
}
