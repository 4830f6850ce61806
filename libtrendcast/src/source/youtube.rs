//! YouTube Data API v3 trending chart
//!
//! Calls `videos.list` with `chart=mostPopular` for one region at a time.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::SourceError;
use crate::source::TrendSource;
use crate::types::{Region, VideoSnapshot};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com";

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    snippet: Snippet,
    #[serde(default)]
    statistics: Statistics,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    /// Decimal string; absent when the uploader hides the count
    view_count: Option<String>,
}

impl VideoItem {
    fn into_snapshot(self, region: Region) -> Result<VideoSnapshot, SourceError> {
        let view_count = match self.statistics.view_count {
            Some(raw) => raw.parse().map_err(|_| {
                SourceError::Malformed(format!("video {} has viewCount '{}'", self.id, raw))
            })?,
            None => {
                tracing::debug!("Video {} hides its view count, using 0", self.id);
                0
            }
        };

        Ok(VideoSnapshot {
            url: VideoSnapshot::watch_url(&self.id),
            id: self.id,
            title: self.snippet.title,
            description: self.snippet.description,
            view_count,
            region,
        })
    }
}

/// Client for the trending chart of the YouTube Data API
pub struct YouTubeClient {
    client: Client,
    api_key: SecretString,
    base_url: String,
}

impl YouTubeClient {
    /// Create a client pointed at the production API
    pub fn new(api_key: SecretString) -> Result<Self, SourceError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client with a custom base URL (for testing with wiremock)
    pub fn with_base_url(api_key: SecretString, base_url: &str) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("trendcast/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| SourceError::Http {
                endpoint: base_url.to_string(),
                source,
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn videos_url(&self) -> String {
        format!("{}/youtube/v3/videos", self.base_url)
    }
}

#[async_trait]
impl TrendSource for YouTubeClient {
    async fn fetch(
        &self,
        region: Region,
        max_results: u32,
    ) -> Result<Vec<VideoSnapshot>, SourceError> {
        let endpoint = self.videos_url();
        let max_results = max_results.to_string();

        let response = self
            .client
            .get(&endpoint)
            .query(&[
                ("part", "snippet,statistics"),
                ("chart", "mostPopular"),
                ("regionCode", region.code()),
                ("maxResults", max_results.as_str()),
                ("key", self.api_key.expose_secret()),
            ])
            .send()
            .await
            .map_err(|source| SourceError::Http {
                endpoint: endpoint.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let list: VideoListResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Malformed(format!("videos.list for {}: {}", region, e)))?;

        list.items
            .into_iter()
            .map(|item| item.into_snapshot(region))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> YouTubeClient {
        YouTubeClient::with_base_url(SecretString::from("test-key".to_string()), base_url)
            .expect("client construction should not fail")
    }

    fn chart_body() -> serde_json::Value {
        serde_json::json!({
            "kind": "youtube#videoListResponse",
            "items": [
                {
                    "id": "vid1",
                    "snippet": { "title": "First", "description": "One" },
                    "statistics": { "viewCount": "1234567", "likeCount": "10" }
                },
                {
                    "id": "vid2",
                    "snippet": { "title": "Second" },
                    "statistics": {}
                }
            ]
        })
    }

    #[tokio::test]
    async fn test_fetch_parses_chart() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/youtube/v3/videos"))
            .and(query_param("chart", "mostPopular"))
            .and(query_param("regionCode", "TR"))
            .and(query_param("maxResults", "5"))
            .and(query_param("part", "snippet,statistics"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chart_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let videos = client.fetch(Region::Turkey, 5).await.unwrap();

        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0].id, "vid1");
        assert_eq!(videos[0].title, "First");
        assert_eq!(videos[0].description, "One");
        assert_eq!(videos[0].view_count, 1_234_567);
        assert_eq!(videos[0].url, "https://www.youtube.com/watch?v=vid1");
        assert_eq!(videos[0].region, Region::Turkey);
        assert_eq!(videos[1].description, "");
        assert_eq!(videos[1].view_count, 0);
    }

    #[tokio::test]
    async fn test_fetch_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/youtube/v3/videos"))
            .respond_with(ResponseTemplate::new(403).set_body_string("quotaExceeded"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        match client.fetch(Region::UnitedStates, 5).await {
            Err(SourceError::Status { status, body }) => {
                assert_eq!(status, 403);
                assert!(body.contains("quotaExceeded"));
            }
            other => panic!("Expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_rejects_non_numeric_view_count() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/youtube/v3/videos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{
                    "id": "bad",
                    "snippet": { "title": "t" },
                    "statistics": { "viewCount": "many" }
                }]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client.fetch(Region::Turkey, 5).await;
        assert!(matches!(result, Err(SourceError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_fetch_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/youtube/v3/videos"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client.fetch(Region::Turkey, 5).await;
        assert!(matches!(result, Err(SourceError::Malformed(_))));
    }
}
