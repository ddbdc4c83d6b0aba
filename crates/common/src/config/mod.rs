//! Configuration management for Observatory services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml, config.yaml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Tabular sources and document directory
    #[serde(default)]
    pub data: DataConfig,

    /// Language model configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Search and listing configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Idle sessions older than this are dropped
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataConfig {
    #[serde(default = "default_researchers_path")]
    pub researchers_path: PathBuf,

    #[serde(default = "default_projects_path")]
    pub projects_path: PathBuf,

    #[serde(default = "default_publications_path")]
    pub publications_path: PathBuf,

    /// Directory scanned for chatbot PDFs
    #[serde(default = "default_documents_dir")]
    pub documents_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// API key; `ANTHROPIC_API_KEY` is used when unset
    pub api_key: Option<String>,

    /// API base URL
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// Model to use
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Maximum output tokens
    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Rows per page for every paginated table
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Researchers considered when building the classifier context
    #[serde(default = "default_summary_researchers")]
    pub summary_researchers: usize,

    /// Researchers rendered in detail in the classifier context
    #[serde(default = "default_summary_detailed")]
    pub summary_detailed: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log filter directive (debug, info, warn, error or a full EnvFilter)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Service name for logs
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Requests per second (global)
    #[serde(default = "default_rate_limit")]
    pub requests_per_second: u32,

    /// Burst capacity
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 60 }
fn default_session_ttl() -> u64 { 3600 }
fn default_researchers_path() -> PathBuf { PathBuf::from("data/academicas.csv") }
fn default_projects_path() -> PathBuf { PathBuf::from("data/proyectos.csv") }
fn default_publications_path() -> PathBuf { PathBuf::from("data/publicaciones.csv") }
fn default_documents_dir() -> PathBuf { PathBuf::from("assets/chatbot") }
fn default_llm_base_url() -> String { "https://api.anthropic.com".to_string() }
fn default_llm_model() -> String { "claude-sonnet-4-5".to_string() }
fn default_llm_timeout() -> u64 { 30 }
fn default_llm_max_tokens() -> u32 { 1024 }
fn default_page_size() -> usize { 24 }
fn default_summary_researchers() -> usize { 30 }
fn default_summary_detailed() -> usize { 15 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_service_name() -> String { "observatory".to_string() }
fn default_rate_limit() -> u32 { 50 }
fn default_burst() -> u32 { 100 }
fn default_enabled() -> bool { true }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            session_ttl_secs: default_session_ttl(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            researchers_path: default_researchers_path(),
            projects_path: default_projects_path(),
            publications_path: default_publications_path(),
            documents_dir: default_documents_dir(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            timeout_secs: default_llm_timeout(),
            max_tokens: default_llm_max_tokens(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            summary_researchers: default_summary_researchers(),
            summary_detailed: default_summary_detailed(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            service_name: default_service_name(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rate_limit(),
            burst: default_burst(),
            enabled: default_enabled(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            data: DataConfig::default(),
            llm: LlmConfig::default(),
            search: SearchConfig::default(),
            observability: ObservabilityConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with APP__ prefix
            // e.g., APP__SERVER__PORT=8081
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: AppConfig = config.try_deserialize()?;
        config.llm.resolve_api_key();
        Ok(config)
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Get session idle TTL as Duration
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.server.session_ttl_secs)
    }
}

impl LlmConfig {
    /// Fall back to the conventional provider variable when no key was configured.
    /// Blank keys count as missing.
    fn resolve_api_key(&mut self) {
        let configured = self
            .api_key
            .take()
            .filter(|key| !key.trim().is_empty());

        self.api_key = configured.or_else(|| {
            std::env::var("ANTHROPIC_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty())
        });
    }

    /// Whether a model backend can be built at all
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.search.page_size, 24);
        assert_eq!(config.search.summary_researchers, 30);
        assert_eq!(config.search.summary_detailed, 15);
    }

    #[test]
    fn test_blank_api_key_is_not_configured() {
        let mut llm = LlmConfig {
            api_key: Some("   ".to_string()),
            ..LlmConfig::default()
        };
        // Only meaningful when the process has no provider key set
        if std::env::var("ANTHROPIC_API_KEY").is_err() {
            llm.resolve_api_key();
            assert!(!llm.is_configured());
        }
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let mut llm = LlmConfig {
            api_key: Some("sk-test".to_string()),
            ..LlmConfig::default()
        };
        llm.resolve_api_key();
        assert_eq!(llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(llm.timeout(), Duration::from_secs(30));
    }
}
