//! Per-region posting quota
//!
//! Bounds how many qualifying videos each region may consume in one pass.
//! A slot is consumed by inspecting a video, whether it ends up published,
//! skipped as a duplicate, or failed.

use std::collections::HashMap;

use crate::types::Region;

/// Default slots per region per pass
pub const DEFAULT_PER_REGION_LIMIT: u32 = 3;

/// Slot counter for one pass
#[derive(Debug, Clone)]
pub struct RegionQuota {
    /// Slots available to each region
    limit: u32,
    consumed: HashMap<Region, u32>,
}

impl RegionQuota {
    /// Create a fresh quota with `limit` slots per region
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            consumed: HashMap::new(),
        }
    }

    /// Whether `region` still has an unused slot
    pub fn has_capacity(&self, region: Region) -> bool {
        self.consumed(region) < self.limit
    }

    /// Consume one slot for `region`
    ///
    /// Returns false (and consumes nothing) if the region is already full.
    pub fn consume(&mut self, region: Region) -> bool {
        if !self.has_capacity(region) {
            return false;
        }
        *self.consumed.entry(region).or_insert(0) += 1;
        true
    }

    /// Slots consumed so far by `region`
    pub fn consumed(&self, region: Region) -> u32 {
        self.consumed.get(&region).copied().unwrap_or(0)
    }

    /// True once every region has used all of its slots
    pub fn exhausted(&self) -> bool {
        Region::ALL.iter().all(|r| !self.has_capacity(*r))
    }
}

impl Default for RegionQuota {
    fn default() -> Self {
        Self::new(DEFAULT_PER_REGION_LIMIT)
    }
}
