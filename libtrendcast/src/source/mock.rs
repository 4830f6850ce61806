//! In-memory trend source for tests

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

use crate::error::SourceError;
use crate::source::TrendSource;
use crate::types::{Region, VideoSnapshot};

/// Returns fixed video lists per region
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    videos: HashMap<Region, Vec<VideoSnapshot>>,
    failing: HashSet<Region>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_region(mut self, region: Region, videos: Vec<VideoSnapshot>) -> Self {
        self.videos.insert(region, videos);
        self
    }

    /// Make every fetch for `region` fail
    pub fn failing_region(mut self, region: Region) -> Self {
        self.failing.insert(region);
        self
    }
}

#[async_trait]
impl TrendSource for StaticSource {
    async fn fetch(
        &self,
        region: Region,
        max_results: u32,
    ) -> Result<Vec<VideoSnapshot>, SourceError> {
        if self.failing.contains(&region) {
            return Err(SourceError::Status {
                status: 503,
                body: format!("mock failure for {}", region),
            });
        }

        Ok(self
            .videos
            .get(&region)
            .map(|videos| videos.iter().take(max_results as usize).cloned().collect())
            .unwrap_or_default())
    }
}
