//! Trending-video data sources

use async_trait::async_trait;
use tracing::info;

use crate::error::SourceError;
use crate::types::{Region, VideoSnapshot};

pub mod youtube;

// Static source is available for all builds to support integration tests
pub mod mock;

/// Ranked list of trending videos for a region
#[async_trait]
pub trait TrendSource: Send + Sync {
    /// Fetch up to `max_results` trending videos for `region`, in chart order
    ///
    /// # Errors
    ///
    /// Any transport or decoding failure. Callers treat this as fatal for the
    /// pass; partial lists are never returned.
    async fn fetch(
        &self,
        region: Region,
        max_results: u32,
    ) -> Result<Vec<VideoSnapshot>, SourceError>;
}

/// Fetch every region in [`Region::ALL`] order and concatenate the results
///
/// Stops at the first failing region.
pub async fn fetch_all(
    source: &dyn TrendSource,
    max_results: u32,
) -> Result<Vec<VideoSnapshot>, SourceError> {
    let mut all = Vec::new();
    for region in Region::ALL {
        let videos = source.fetch(region, max_results).await?;
        info!("Fetched {} trending video(s) for {}", videos.len(), region);
        all.extend(videos);
    }
    Ok(all)
}
