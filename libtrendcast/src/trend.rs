//! Trend filter: decides which videos are worth posting about
//!
//! A video qualifies when it has never been seen before, or when its view
//! count grew by more than the threshold since the last pass. Every observed
//! video updates the baseline whether or not it qualifies.

use tracing::{debug, info};

use crate::error::StoreError;
use crate::store::{Baseline, BaselineStore};
use crate::types::VideoSnapshot;

/// Minimum view-count growth between passes for a known video to qualify
pub const DEFAULT_VIEW_THRESHOLD: u64 = 10_000;

/// Why a video qualified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// First sighting of this video id
    New,
    /// View count grew by `delta` since the last observation
    Jump { delta: u64 },
}

/// A video that cleared the filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Qualified {
    pub video: VideoSnapshot,
    pub reason: Reason,
}

/// Result of evaluating one pass worth of videos
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendOutcome {
    /// Qualifying videos in input order
    pub qualifying: Vec<Qualified>,
    /// Baseline with every input video's current count applied
    pub baseline: Baseline,
}

impl TrendOutcome {
    pub fn videos(&self) -> impl Iterator<Item = &VideoSnapshot> {
        self.qualifying.iter().map(|q| &q.video)
    }
}

/// Evaluate `videos` against `previous` without touching any storage.
///
/// The caller is expected to have removed duplicate ids already. A view count
/// that went down is simply not a jump.
pub fn evaluate(videos: &[VideoSnapshot], previous: &Baseline, threshold: u64) -> TrendOutcome {
    let mut baseline = previous.clone();
    let mut qualifying = Vec::new();

    for video in videos {
        let reason = match previous.get(&video.id) {
            None => Some(Reason::New),
            Some(last) => {
                let delta = video.view_count as i128 - last as i128;
                if delta > threshold as i128 {
                    Some(Reason::Jump {
                        delta: delta as u64,
                    })
                } else {
                    debug!(
                        video_id = %video.id,
                        delta = %delta,
                        "View count growth below threshold"
                    );
                    None
                }
            }
        };

        baseline.insert(video.id.clone(), video.view_count);

        if let Some(reason) = reason {
            qualifying.push(Qualified {
                video: video.clone(),
                reason,
            });
        }
    }

    TrendOutcome {
        qualifying,
        baseline,
    }
}

/// Trend filter bound to its durable baseline
pub struct TrendFilter {
    store: BaselineStore,
    threshold: u64,
}

impl TrendFilter {
    pub fn new(store: BaselineStore, threshold: u64) -> Self {
        Self { store, threshold }
    }

    /// Load the baseline, evaluate `videos`, and persist the new baseline once.
    ///
    /// The save happens after every video is evaluated. A crash before it
    /// loses this pass's observations but never leaves a partial baseline.
    pub fn run(&self, videos: &[VideoSnapshot]) -> Result<TrendOutcome, StoreError> {
        let previous = self.store.load()?;
        let outcome = evaluate(videos, &previous, self.threshold);
        self.store.save(&outcome.baseline)?;

        info!(
            "Trend filter: {} of {} video(s) qualify (baseline now {} entries)",
            outcome.qualifying.len(),
            videos.len(),
            outcome.baseline.len()
        );
        Ok(outcome)
    }
}
