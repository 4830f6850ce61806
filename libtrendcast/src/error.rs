//! Error types for Trendcast

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrendcastError>;

#[derive(Error, Debug)]
pub enum TrendcastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Trend source error: {0}")]
    Source(#[from] SourceError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

impl TrendcastError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            TrendcastError::Config(_) => 2,
            TrendcastError::Source(_) => 1,
            TrendcastError::Store(_) => 1,
            TrendcastError::Platform(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but does not parse. Never recovered by resetting state.
    #[error("Corrupt state file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize state for {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Trend API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed trend response: {0}")]
    Malformed(String),

    #[error("Missing API key: set {0}")]
    MissingKey(String),
}

#[derive(Error, Debug, Clone)]
pub enum PlatformError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Content validation failed: {0}")]
    Validation(String),

    #[error("Posting failed: {0}")]
    Posting(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_config_error() {
        let error = TrendcastError::Config(ConfigError::MissingField("storage".to_string()));
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_source_error() {
        let error = TrendcastError::Source(SourceError::Status {
            status: 503,
            body: "backend error".to_string(),
        });
        assert_eq!(error.exit_code(), 1);
    }

    #[test]
    fn test_exit_code_store_error() {
        let error = TrendcastError::Store(StoreError::Io {
            path: PathBuf::from("/tmp/ledger.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        });
        assert_eq!(error.exit_code(), 1);
    }

    #[test]
    fn test_error_message_formatting_rate_limit() {
        let error = TrendcastError::Platform(PlatformError::RateLimit(
            "Too many requests".to_string(),
        ));
        assert_eq!(
            error.to_string(),
            "Platform error: Rate limit exceeded: Too many requests"
        );
    }

    #[test]
    fn test_corrupt_store_message_names_file() {
        let source = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let error = StoreError::Corrupt {
            path: PathBuf::from("/var/lib/trendcast/ledger.json"),
            source,
        };
        let message = error.to_string();
        assert!(message.contains("Corrupt state file"));
        assert!(message.contains("ledger.json"));
    }

    #[test]
    fn test_error_conversion_from_source_error() {
        let error: TrendcastError = SourceError::MissingKey("YOUTUBE_API_KEY".to_string()).into();
        match error {
            TrendcastError::Source(SourceError::MissingKey(var)) => {
                assert_eq!(var, "YOUTUBE_API_KEY")
            }
            _ => panic!("Expected TrendcastError::Source"),
        }
    }

    #[test]
    fn test_platform_error_clone() {
        let original = PlatformError::Network("Connection failed".to_string());
        let cloned = original.clone();

        assert_eq!(format!("{}", original), format!("{}", cloned));
    }
}
