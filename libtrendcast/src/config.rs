//! Configuration management for Trendcast
//!
//! Read from `$TRENDCAST_CONFIG` or `<config dir>/trendcast/config.toml`.
//! Every section is optional. A missing file at the default location means
//! all defaults; a missing file named by `$TRENDCAST_CONFIG` is an error.
//!
//! ```toml
//! [storage]
//! baseline_path = "~/.local/share/trendcast/baseline.json"
//! ledger_path = "~/.local/share/trendcast/ledger.json"
//!
//! [youtube]
//! api_key_env = "YOUTUBE_API_KEY"
//! max_results = 5
//!
//! [twitter]
//! bearer_token_env = "TWITTER_BEARER_TOKEN"
//!
//! [trend]
//! view_threshold = 10000
//!
//! [publishing]
//! per_region_limit = 3
//! rate_limit_backoff = "15m"
//! max_rate_limit_retries = 3
//!
//! [hashtags]
//! general = ["#trending", "#Turkey", "#USA", "#YouTube", "#viral", "#video"]
//! max_dynamic = 5
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;

use crate::error::{ConfigError, Result};
use crate::hashtags::default_general_hashtags;
use crate::quota::DEFAULT_PER_REGION_LIMIT;
use crate::trend::DEFAULT_VIEW_THRESHOLD;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub youtube: YouTubeConfig,
    pub twitter: TwitterConfig,
    pub trend: TrendConfig,
    pub publishing: PublishingConfig,
    pub hashtags: HashtagConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub baseline_path: String,
    pub ledger_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YouTubeConfig {
    /// Environment variable holding the Data API key
    pub api_key_env: String,
    pub max_results: u32,
    /// Override for testing against a local server
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitterConfig {
    /// Environment variable holding the user-context bearer token
    pub bearer_token_env: String,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    pub view_threshold: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishingConfig {
    pub per_region_limit: u32,
    /// Human-readable duration, e.g. "15m"
    pub rate_limit_backoff: String,
    pub max_rate_limit_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HashtagConfig {
    pub general: Vec<String>,
    pub max_dynamic: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            baseline_path: "~/.local/share/trendcast/baseline.json".to_string(),
            ledger_path: "~/.local/share/trendcast/ledger.json".to_string(),
        }
    }
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_key_env: "YOUTUBE_API_KEY".to_string(),
            max_results: 5,
            base_url: None,
        }
    }
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            bearer_token_env: "TWITTER_BEARER_TOKEN".to_string(),
            base_url: None,
        }
    }
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            view_threshold: DEFAULT_VIEW_THRESHOLD,
        }
    }
}

impl Default for PublishingConfig {
    fn default() -> Self {
        Self {
            per_region_limit: DEFAULT_PER_REGION_LIMIT,
            rate_limit_backoff: "15m".to_string(),
            max_rate_limit_retries: 3,
        }
    }
}

impl Default for HashtagConfig {
    fn default() -> Self {
        Self {
            general: default_general_hashtags(),
            max_dynamic: 5,
        }
    }
}

impl Config {
    /// Load configuration from `$TRENDCAST_CONFIG` or the default location
    ///
    /// Falls back to defaults only when the default file does not exist.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var("TRENDCAST_CONFIG") {
            return Self::load_from_path(&expand_path(&path));
        }

        let config_path = resolve_config_path()?;
        if !config_path.exists() {
            tracing::debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default_config());
        }
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Reject values that would make a pass misbehave
    pub fn validate(&self) -> Result<()> {
        if self.youtube.max_results == 0 || self.youtube.max_results > 50 {
            return Err(ConfigError::InvalidValue {
                field: "youtube.max_results".to_string(),
                reason: "must be between 1 and 50".to_string(),
            }
            .into());
        }
        self.rate_limit_backoff()?;
        Ok(())
    }

    /// Parsed `publishing.rate_limit_backoff`
    pub fn rate_limit_backoff(&self) -> Result<Duration> {
        humantime::parse_duration(&self.publishing.rate_limit_backoff).map_err(|e| {
            ConfigError::InvalidValue {
                field: "publishing.rate_limit_backoff".to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    pub fn baseline_path(&self) -> PathBuf {
        expand_path(&self.storage.baseline_path)
    }

    pub fn ledger_path(&self) -> PathBuf {
        expand_path(&self.storage.ledger_path)
    }

    /// YouTube API key from the configured environment variable
    pub fn youtube_api_key(&self) -> Result<SecretString> {
        read_secret_env(&self.youtube.api_key_env)
    }

    /// X bearer token from the configured environment variable
    pub fn twitter_bearer_token(&self) -> Result<SecretString> {
        read_secret_env(&self.twitter.bearer_token_env)
    }
}

fn read_secret_env(var: &str) -> Result<SecretString> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(SecretString::from(value.trim().to_string())),
        _ => Err(ConfigError::MissingField(format!("environment variable {}", var)).into()),
    }
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("TRENDCAST_CONFIG") {
        return Ok(expand_path(&path));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("trendcast").join("config.toml"))
}
