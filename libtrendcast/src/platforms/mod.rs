//! Publication transports
//!
//! A [`Publisher`] takes a finished post and sends it to a social platform.
//! Transports report failures as [`PlatformError`]s; the controller only
//! distinguishes rate limiting from everything else, see [`PublishOutcome`].
//!
//! # Examples
//!
//! ```no_run
//! use libtrendcast::platforms::{Publisher, PublishOutcome, twitter::TwitterClient};
//!
//! # async fn example() -> libtrendcast::error::Result<()> {
//! let client = TwitterClient::new("token".to_string().into())?;
//! client.validate_content("Hello!")?;
//!
//! match PublishOutcome::from_result(client.publish("Hello!").await) {
//!     PublishOutcome::Published(id) => println!("Posted: {}", id),
//!     PublishOutcome::RateLimited(detail) => eprintln!("Slow down: {}", detail),
//!     PublishOutcome::Failed(detail) => eprintln!("Failed: {}", detail),
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;

use crate::error::{PlatformError, Result, TrendcastError};

pub mod twitter;

// Mock publisher is available for all builds (not just tests) to support integration tests
pub mod mock;

/// Social platform that can publish text posts
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish `text` and return the platform's id for the new post
    ///
    /// # Errors
    ///
    /// - `PlatformError::RateLimit` when the platform asks us to back off
    /// - `PlatformError::Authentication` for rejected credentials
    /// - `PlatformError::Validation` when the platform rejects the content
    /// - `PlatformError::Network` / `PlatformError::Posting` otherwise
    async fn publish(&self, text: &str) -> Result<String>;

    /// Check content against platform rules before publishing
    fn validate_content(&self, content: &str) -> Result<()> {
        if content.is_empty() {
            return Err(PlatformError::Validation("Content cannot be empty".to_string()).into());
        }

        if let Some(limit) = self.character_limit() {
            let length = self.content_length(content);
            if length > limit {
                return Err(PlatformError::Validation(format!(
                    "Content exceeds {}'s {} character limit (current: {} characters)",
                    self.name(),
                    limit,
                    length
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Length of `content` as the platform counts it against `character_limit`
    fn content_length(&self, content: &str) -> usize {
        content.chars().count()
    }

    /// Lowercase platform identifier (e.g. "twitter")
    fn name(&self) -> &str;

    /// Maximum post length in characters, if the platform has one
    fn character_limit(&self) -> Option<usize>;
}

/// What a publish attempt means for the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Accepted; carries the remote post id
    Published(String),
    /// Platform asked us to back off; worth retrying the same payload later
    RateLimited(String),
    /// Any other failure; not retried this pass
    Failed(String),
}

impl PublishOutcome {
    /// Classify a transport result
    pub fn from_result(result: Result<String>) -> Self {
        match result {
            Ok(id) => PublishOutcome::Published(id),
            Err(TrendcastError::Platform(PlatformError::RateLimit(detail))) => {
                PublishOutcome::RateLimited(detail)
            }
            Err(e) => PublishOutcome::Failed(e.to_string()),
        }
    }
}
