//! Baseline store: last observed view count per video id

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{read_json, write_json};
use crate::error::StoreError;

/// Snapshot of last observed view counts, keyed by video id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Baseline(BTreeMap<String, u64>);

impl Baseline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, video_id: &str) -> Option<u64> {
        self.0.get(video_id).copied()
    }

    /// Record an observation, returning the previous count if any
    pub fn insert(&mut self, video_id: impl Into<String>, view_count: u64) -> Option<u64> {
        self.0.insert(video_id.into(), view_count)
    }

    pub fn contains(&self, video_id: &str) -> bool {
        self.0.contains_key(video_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(id, count)| (id.as_str(), *count))
    }
}

impl FromIterator<(String, u64)> for Baseline {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One stored count, in either the current or the legacy file layout
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(try_from = "RawCount")]
struct StoredCount(u64);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCount {
    Plain(u64),
    Legacy { view_count: CountValue },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CountValue {
    Number(u64),
    Text(String),
}

impl TryFrom<RawCount> for StoredCount {
    type Error = String;

    fn try_from(raw: RawCount) -> Result<Self, Self::Error> {
        match raw {
            RawCount::Plain(n) | RawCount::Legacy { view_count: CountValue::Number(n) } => {
                Ok(StoredCount(n))
            }
            RawCount::Legacy {
                view_count: CountValue::Text(text),
            } => text
                .trim()
                .parse()
                .map(StoredCount)
                .map_err(|e| format!("invalid view_count '{}': {}", text, e)),
        }
    }
}

/// JSON file holding the [`Baseline`]
#[derive(Debug, Clone)]
pub struct BaselineStore {
    path: PathBuf,
}

impl BaselineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the baseline; an absent file is an empty baseline
    ///
    /// Accepts both `{"id": 123}` and the legacy `{"id": {"view_count": "123"}}`.
    pub fn load(&self) -> Result<Baseline, StoreError> {
        let stored: Option<BTreeMap<String, StoredCount>> = read_json(&self.path)?;
        let baseline: Baseline = stored
            .unwrap_or_default()
            .into_iter()
            .map(|(id, count)| (id, count.0))
            .collect();
        debug!(
            "Loaded baseline with {} entries from {}",
            baseline.len(),
            self.path.display()
        );
        Ok(baseline)
    }

    /// Replace the persisted baseline with `baseline`
    pub fn save(&self, baseline: &Baseline) -> Result<(), StoreError> {
        write_json(&self.path, baseline)?;
        debug!(
            "Saved baseline with {} entries to {}",
            baseline.len(),
            self.path.display()
        );
        Ok(())
    }
}
