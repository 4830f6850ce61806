//! Publication ledger: every payload that has been published
//!
//! Entries are opaque strings compared byte for byte. The ledger only grows.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{read_json, write_json};
use crate::error::StoreError;

/// Set of published payloads
///
/// Serialized as a sorted JSON array so repeated saves produce identical files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger(BTreeSet<String>);

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact membership test, no normalization
    pub fn contains(&self, payload: &str) -> bool {
        self.0.contains(payload)
    }

    /// Record a payload; returns false if it was already present
    pub fn insert(&mut self, payload: impl Into<String>) -> bool {
        self.0.insert(payload.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl FromIterator<String> for Ledger {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// JSON file holding the [`Ledger`]
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the ledger; an absent file is an empty ledger
    ///
    /// A malformed file is an error, never an empty ledger.
    pub fn load(&self) -> Result<Ledger, StoreError> {
        let ledger: Ledger = read_json(&self.path)?.unwrap_or_default();
        debug!(
            "Loaded ledger with {} entries from {}",
            ledger.len(),
            self.path.display()
        );
        Ok(ledger)
    }

    /// Replace the persisted ledger with `ledger`
    pub fn save(&self, ledger: &Ledger) -> Result<(), StoreError> {
        write_json(&self.path, ledger)?;
        debug!(
            "Saved ledger with {} entries to {}",
            ledger.len(),
            self.path.display()
        );
        Ok(())
    }
}
