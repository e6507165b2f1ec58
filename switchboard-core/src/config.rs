use crate::provider::GenerationParams;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration for the router process.
///
/// Every section is optional in the YAML file; missing sections and fields
/// fall back to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub defaults: RequestDefaults,
    pub bedrock: BedrockConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Map caller mistakes to 400 and backend failures to 502 instead of
    /// answering every failure with 500.
    pub strict_status: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            strict_status: false,
        }
    }
}

/// Values used when an inbound request omits a field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestDefaults {
    pub provider: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub stream: bool,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        let params = GenerationParams::default();
        Self {
            provider: "bedrock".to_string(),
            model: "anthropic.claude-v2".to_string(),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            stream: params.stream,
        }
    }
}

impl RequestDefaults {
    pub fn params(&self) -> GenerationParams {
        GenerationParams {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream: self.stream,
        }
    }
}

/// Amazon Bedrock settings.
///
/// Credentials left unset here are read from the standard AWS environment
/// variables when the provider is built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BedrockConfig {
    /// AWS region; falls back to `AWS_REGION`, `AWS_DEFAULT_REGION`, then `us-east-1`.
    pub region: Option<String>,
    /// Overrides `https://bedrock-runtime.{region}.amazonaws.com` (proxies, tests).
    pub endpoint: Option<String>,
    /// Whole-request timeout for the HTTP client.
    pub timeout_secs: Option<u64>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    pub bearer_token: Option<String>,
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from `config.yaml` if it exists, otherwise use defaults.
    pub fn load_or_default() -> Self {
        Self::load_path_or_default("config.yaml")
    }

    /// Like [`load_or_default`](Self::load_or_default) for an explicit path.
    ///
    /// A missing file is silent; a file that cannot be read or parsed is
    /// logged before falling back to defaults.
    pub fn load_path_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(ConfigError::FileRead(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Self::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unusable config file, using defaults");
                Self::default()
            }
        }
    }
}
