//! Expiring row cache.
//!
//! Editors change the spreadsheet rarely but builds run often (every preview,
//! every deploy). This module keeps the last successful fetch on disk so that
//! repeated builds within a short window skip the network entirely.
//!
//! # Design
//!
//! One cache entry per sheet, stored as `{key_prefix}_{sheet_id}.json` in
//! the temp directory:
//!
//! ```json
//! { "data": [ { "position": "1", "typ": "bild", ... } ], "timestamp": 1718000000000 }
//! ```
//!
//! `timestamp` is milliseconds since the UNIX epoch at write time. An entry
//! is valid while `now - timestamp` is within the TTL; an expired entry is
//! deleted on read. A TTL of zero disables the cache: nothing is read and
//! nothing is written.
//!
//! The cache is advisory. A missing, unreadable or corrupt file is a miss,
//! never an error, and failed writes are reported to the caller to log.

use crate::types::Row;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// On-disk cache entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry {
    pub data: Vec<Row>,
    pub timestamp: u64,
}

/// Cache for one sheet's rows.
#[derive(Debug, Clone)]
pub struct RowCache {
    path: PathBuf,
    ttl: Duration,
}

/// Milliseconds since the UNIX epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Cache key for a source: `{prefix}_{source_id}`, restricted to
/// filename-safe characters.
pub fn cache_key(prefix: &str, source_id: &str) -> String {
    format!("{}_{}", prefix, source_id)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

impl RowCache {
    pub fn new(dir: &Path, prefix: &str, source_id: &str, ttl: Duration) -> Self {
        Self {
            path: dir.join(format!("{}.json", cache_key(prefix, source_id))),
            ttl,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Cached rows if a fresh entry exists.
    pub fn get(&self) -> Option<Vec<Row>> {
        self.get_at(now_millis())
    }

    /// Cached rows if an entry exists that is fresh at `now` (ms).
    pub fn get_at(&self, now: u64) -> Option<Vec<Row>> {
        if !self.is_enabled() {
            return None;
        }
        let content = std::fs::read_to_string(&self.path).ok()?;
        let entry: CacheEntry = serde_json::from_str(&content).ok()?;

        let age = Duration::from_millis(now.saturating_sub(entry.timestamp));
        if age > self.ttl {
            // Expired entries are dropped so the next read is a clean miss.
            let _ = std::fs::remove_file(&self.path);
            return None;
        }
        Some(entry.data)
    }

    /// Store rows with the current time.
    pub fn put(&self, rows: &[Row]) -> io::Result<()> {
        self.put_at(rows, now_millis())
    }

    /// Store rows stamped with `now` (ms).
    pub fn put_at(&self, rows: &[Row], now: u64) -> io::Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let entry = CacheEntry {
            data: rows.to_vec(),
            timestamp: now,
        };
        let json = serde_json::to_string(&entry)?;
        std::fs::write(&self.path, json)
    }

    /// Remove the entry. Missing entries are fine.
    pub fn clear(&self) -> io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}
