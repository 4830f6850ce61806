//! Core types for Trendcast

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Trending region a video was fetched from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Region {
    Turkey,
    UnitedStates,
}

impl Region {
    /// Fetch order for a pass
    pub const ALL: [Region; 2] = [Region::Turkey, Region::UnitedStates];

    /// ISO 3166-1 code used by the trend API (e.g. "TR")
    pub fn code(&self) -> &'static str {
        match self {
            Region::Turkey => "TR",
            Region::UnitedStates => "US",
        }
    }

    /// Label rendered into post payloads
    pub fn label(&self) -> &'static str {
        match self {
            Region::Turkey => "Türkiye",
            Region::UnitedStates => "ABD",
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A video as returned by one fetch of the trending chart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VideoSnapshot {
    pub id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub view_count: u64,
    pub region: Region,
}

impl VideoSnapshot {
    /// Watch URL for a YouTube video id
    pub fn watch_url(id: &str) -> String {
        format!("https://www.youtube.com/watch?v={}", id)
    }
}

/// Drop repeated video ids, keeping the first occurrence and input order.
///
/// A video trending in both regions is attributed to the region fetched first.
pub fn dedupe_by_id(videos: Vec<VideoSnapshot>) -> Vec<VideoSnapshot> {
    let mut seen = HashSet::new();
    videos
        .into_iter()
        .filter(|video| seen.insert(video.id.clone()))
        .collect()
}
