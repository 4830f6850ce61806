//! X (Twitter) API v2 publisher

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{PlatformError, Result};
use crate::platforms::Publisher;

const DEFAULT_BASE_URL: &str = "https://api.twitter.com";

/// Maximum weighted length of a standard post
pub const TWITTER_CHARACTER_LIMIT: usize = 280;

/// Weight X gives every link, whatever its real length
const TRANSFORMED_URL_LENGTH: usize = 23;

/// Length of `text` as X counts it
///
/// Links count as 23. Latin, Greek, Cyrillic and general punctuation count
/// as 1; everything else (CJK, emoji) counts as 2. Variation selectors, skin
/// tone modifiers and zero-width joiners add nothing, so an emoji sequence
/// costs the same as its base emoji.
pub fn weighted_length(text: &str) -> usize {
    let mut length = 0;
    let mut rest = text;

    while !rest.is_empty() {
        if let Some(end) = url_len(rest) {
            length += TRANSFORMED_URL_LENGTH;
            rest = &rest[end..];
            continue;
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            length += char_weight(c);
        }
        rest = chars.as_str();
    }

    length
}

/// Byte length of the link at the start of `text`, if it starts with one
fn url_len(text: &str) -> Option<usize> {
    let scheme = ["https://", "http://"]
        .into_iter()
        .find(|scheme| text.starts_with(scheme))?;
    let end = text.find(char::is_whitespace).unwrap_or(text.len());
    (end > scheme.len()).then_some(end)
}

fn char_weight(c: char) -> usize {
    match c as u32 {
        0xFE00..=0xFE0F | 0x1F3FB..=0x1F3FF | 0x200D => 0,
        0x0000..=0x10FF | 0x2000..=0x200C | 0x2010..=0x201F | 0x2032..=0x2037 => 1,
        _ => 2,
    }
}

#[derive(Serialize)]
struct CreateTweetRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct CreateTweetResponse {
    data: CreatedTweet,
}

#[derive(Deserialize)]
struct CreatedTweet {
    id: String,
}

/// Map an HTTP error status to a PlatformError
fn map_status_error(status: StatusCode, body: &str) -> PlatformError {
    let detail = format!("{} {}", status.as_u16(), body.trim());
    match status {
        StatusCode::TOO_MANY_REQUESTS => PlatformError::RateLimit(format!(
            "X rate limit exceeded: {}. Please wait before trying again.",
            detail
        )),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PlatformError::Authentication(format!(
            "X rejected the credentials: {}. Check the bearer token and its write scope.",
            detail
        )),
        StatusCode::BAD_REQUEST => {
            PlatformError::Validation(format!("X rejected the post: {}", detail))
        }
        _ => PlatformError::Posting(format!("X posting failed: {}", detail)),
    }
}

/// Map a transport-level reqwest failure to a PlatformError
fn map_request_error(error: reqwest::Error) -> PlatformError {
    if error.is_timeout() || error.is_connect() || error.is_request() {
        PlatformError::Network(format!("Unable to reach X API: {}", error))
    } else {
        PlatformError::Posting(format!("X posting failed: {}", error))
    }
}

/// Posts text to `POST /2/tweets` with a user-context bearer token
pub struct TwitterClient {
    client: Client,
    base_url: String,
    bearer_token: SecretString,
}

impl TwitterClient {
    /// Create a client pointed at the production X API
    pub fn new(bearer_token: SecretString) -> Result<Self> {
        Self::with_base_url(bearer_token, DEFAULT_BASE_URL)
    }

    /// Create a client with a custom base URL (for testing with wiremock)
    pub fn with_base_url(bearer_token: SecretString, base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("trendcast/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PlatformError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token,
        })
    }

    fn tweets_url(&self) -> String {
        format!("{}/2/tweets", self.base_url)
    }
}

#[async_trait]
impl Publisher for TwitterClient {
    async fn publish(&self, text: &str) -> Result<String> {
        tracing::debug!("Posting to X: {} characters", text.chars().count());

        let response = self
            .client
            .post(self.tweets_url())
            .bearer_auth(self.bearer_token.expose_secret())
            .json(&CreateTweetRequest { text })
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status_error(status, &body).into());
        }

        let created: CreateTweetResponse = response
            .json()
            .await
            .map_err(|e| PlatformError::Posting(format!("Unexpected X response: {}", e)))?;

        tracing::debug!("Posted to X: {}", created.data.id);
        Ok(created.data.id)
    }

    fn content_length(&self, content: &str) -> usize {
        weighted_length(content)
    }

    fn name(&self) -> &str {
        "twitter"
    }

    fn character_limit(&self) -> Option<usize> {
        Some(TWITTER_CHARACTER_LIMIT)
    }
}
