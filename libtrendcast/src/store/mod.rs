//! File-backed durable state
//!
//! Both stores are whole-file JSON documents. A save serializes the complete
//! container to a temp file next to the target, syncs it, renames it into place
//! and syncs the directory, so a reader always sees either the previous or the
//! new version, even after a crash.
//!
//! There is no locking: two overlapping passes race on load/modify/save and
//! one of them silently loses its update. Invocations must be serialized by
//! whatever schedules them.

pub mod baseline;
pub mod ledger;

pub use baseline::{Baseline, BaselineStore};
pub use ledger::{Ledger, LedgerStore};

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::StoreError;

/// Read and parse a JSON file, returning `None` when it does not exist
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No state file at {}, starting empty", path.display());
            return Ok(None);
        }
        Err(source) => return Err(io_error(path, source)),
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| StoreError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
}

/// Serialize `value` and atomically replace the file at `path`
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let content = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    atomic_write(path, &content)
}

/// Atomic write via temp file + fsync + rename + dir fsync
fn atomic_write(path: &Path, content: &[u8]) -> Result<(), StoreError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;

    let temp_path = parent.join(format!(".tmp_{}", uuid::Uuid::new_v4()));
    if let Err(source) = write_synced(&temp_path, content) {
        let _ = fs::remove_file(&temp_path);
        return Err(io_error(&temp_path, source));
    }
    if let Err(source) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(io_error(path, source));
    }
    sync_dir(parent).map_err(|source| io_error(parent, source))
}

fn write_synced(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content)?;
    file.sync_all()
}

/// Persist the rename itself; directories cannot be opened for sync on Windows
#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}
