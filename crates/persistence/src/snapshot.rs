//! The on-disk snapshot schema (§4.4). Schema is versioned so future field
//! additions do not corrupt older snapshots on disk (§9).

use crate::error::CacheError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use wg_core::SeedRecord;

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedCacheSnapshot {
    version: u32,
    pub entries: HashMap<String, SeedRecord>,
    pub last_scan: DateTime<Utc>,
}

impl SeedCacheSnapshot {
    pub fn empty() -> Self {
        Self { version: SNAPSHOT_VERSION, entries: HashMap::new(), last_scan: Utc::now() }
    }

    /// Reads the snapshot from disk, returning an empty one if the file is
    /// absent or unreadable/corrupt (§4.4 `load()`).
    pub fn load(path: &Path) -> Self {
        match std::fs::read(path) {
            Ok(bytes) => match bincode::deserialize::<Self>(&bytes) {
                Ok(snapshot) if snapshot.version == SNAPSHOT_VERSION => snapshot,
                Ok(_) | Err(_) => {
                    tracing::warn!(path = %path.display(), "seed cache snapshot unreadable or version mismatch; starting empty");
                    Self::empty()
                }
            },
            Err(_) => Self::empty(),
        }
    }

    /// Atomically replaces the on-disk blob: write to a temp file in the
    /// same directory, then rename over the target (§4.4 `save()`).
    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        let bytes = bincode::serialize(self).map_err(|err| CacheError::Corrupt(err.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp_path = path.with_extension("bin.tmp");
        std::fs::write(&tmp_path, bytes)?;
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }
}
