//! The seed cache itself (§4.4): a content-addressed, on-disk index mapping
//! filename -> (hash, verdict, scores, timestamp, path).

use crate::error::CacheError;
use crate::hash::{sha256_hex, sha256_many};
use crate::snapshot::SeedCacheSnapshot;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use wg_config::SeedPaths;
use wg_core::SeedRecord;
use wg_safety::SafetyClassifier;

/// Totals returned by a rescan, for the `/seeds/rescan` response.
#[derive(Debug, Clone, Default)]
pub struct RescanTotals {
    pub total: usize,
    pub safe: usize,
    pub unsafe_count: usize,
}

pub struct SeedCache {
    paths: SeedPaths,
    classifier: Arc<SafetyClassifier>,
    /// All bulk mutations and all reads funnel through this single guard so
    /// a caller never observes a partially-completed scan (§4.4 concurrency).
    snapshot: Mutex<SeedCacheSnapshot>,
}

impl SeedCache {
    /// Loads the on-disk snapshot (or an empty one) and wraps it for use.
    pub fn load(paths: SeedPaths, classifier: Arc<SafetyClassifier>) -> Self {
        let snapshot = SeedCacheSnapshot::load(&paths.cache_file());
        Self { paths, classifier, snapshot: Mutex::new(snapshot) }
    }

    async fn persist(&self, snapshot: &SeedCacheSnapshot) -> Result<(), CacheError> {
        snapshot.save(&self.paths.cache_file())
    }

    /// Safe-only listing by default; callers pass `include_unsafe = true`
    /// for the operator opt-in (§9 Open Question, resolved in `wg-config`).
    pub async fn list(&self, include_unsafe: bool) -> Vec<SeedRecord> {
        let snapshot = self.snapshot.lock().await;
        snapshot
            .entries
            .values()
            .filter(|record| include_unsafe || record.is_safe)
            .cloned()
            .collect()
    }

    pub async fn get(&self, filename: &str) -> Option<SeedRecord> {
        let snapshot = self.snapshot.lock().await;
        snapshot.entries.get(filename).cloned()
    }

    /// Re-hashes the file on disk and compares to the cached hash. A
    /// mismatch fails with the integrity error the caller must surface
    /// verbatim (§4.4 `verify()`, §8 invariant 1).
    pub async fn verify(&self, filename: &str) -> Result<SeedRecord, CacheError> {
        let record = {
            let snapshot = self.snapshot.lock().await;
            snapshot.entries.get(filename).cloned().ok_or_else(|| CacheError::NotFound(filename.to_string()))?
        };
        if !record.path.exists() {
            return Err(CacheError::NotFound(filename.to_string()));
        }
        let current_hash = sha256_hex(&record.path)?;
        if current_hash != record.hash {
            return Err(CacheError::IntegrityMismatch);
        }
        Ok(record)
    }

    /// Enumerates both seed directories and classifies everything found as
    /// one batch, replacing the snapshot wholesale (§4.4 `rescan()`).
    pub async fn rescan(&self) -> Result<RescanTotals, CacheError> {
        let mut snapshot = self.snapshot.lock().await;
        let files = self.enumerate_seed_files();
        let hashed = sha256_many(&files);

        let filenames: Vec<String> =
            hashed.iter().map(|(path, _)| filename_of(path)).collect::<Result<_, _>>()?;
        let paths: Vec<PathBuf> = hashed.iter().map(|(path, _)| path.clone()).collect();
        let verdicts = self.classifier.check_batch(&paths, 16).await?;

        let mut entries = std::collections::HashMap::new();
        let mut totals = RescanTotals::default();
        for (((path, hash), filename), verdict) in
            hashed.into_iter().zip(filenames.into_iter()).zip(verdicts.into_iter())
        {
            totals.total += 1;
            if verdict.is_safe {
                totals.safe += 1;
            } else {
                totals.unsafe_count += 1;
            }
            entries.insert(
                filename.clone(),
                SeedRecord {
                    filename,
                    hash,
                    is_safe: verdict.is_safe,
                    scores: verdict.scores,
                    path,
                    checked_at: Utc::now(),
                    error: None,
                },
            );
        }

        snapshot.entries = entries;
        snapshot.last_scan = Utc::now();
        self.persist(&snapshot).await?;
        info!(total = totals.total, safe = totals.safe, unsafe_count = totals.unsafe_count, "seed rescan complete");
        Ok(totals)
    }

    /// Incremental repair (§4.4 `validate_and_update()`):
    /// - entries whose file vanished are dropped;
    /// - a single hash mismatch invalidates the whole snapshot, since cached
    ///   verdicts can no longer be trusted once desynchronized from disk,
    ///   so this falls back to a full [`Self::rescan`];
    /// - newly appeared files are classified and inserted.
    pub async fn validate_and_update(&self) -> Result<RescanTotals, CacheError> {
        let needs_rescan = {
            let snapshot = self.snapshot.lock().await;
            let mut stale = Vec::new();
            let mut mismatched = false;
            for (filename, record) in snapshot.entries.iter() {
                if !record.path.exists() {
                    stale.push(filename.clone());
                    continue;
                }
                match sha256_hex(&record.path) {
                    Ok(hash) if hash == record.hash => {}
                    _ => {
                        mismatched = true;
                        break;
                    }
                }
            }
            let _ = stale;
            mismatched
        };

        if needs_rescan {
            warn!("seed cache desynchronized from disk; performing full rescan");
            return self.rescan().await;
        }

        let mut snapshot = self.snapshot.lock().await;
        snapshot.entries.retain(|_, record| record.path.exists());

        let known: std::collections::HashSet<PathBuf> =
            snapshot.entries.values().map(|record| record.path.clone()).collect();
        let new_files: Vec<PathBuf> =
            self.enumerate_seed_files().into_iter().filter(|path| !known.contains(path)).collect();

        let mut totals = RescanTotals { total: snapshot.entries.len(), ..Default::default() };
        if !new_files.is_empty() {
            let hashed = sha256_many(&new_files);
            let paths: Vec<PathBuf> = hashed.iter().map(|(path, _)| path.clone()).collect();
            let verdicts = self.classifier.check_batch(&paths, 16).await?;
            for ((path, hash), verdict) in hashed.into_iter().zip(verdicts.into_iter()) {
                let filename = filename_of(&path)?;
                totals.total += 1;
                entries_bump(&mut totals, verdict.is_safe);
                snapshot.entries.insert(
                    filename.clone(),
                    SeedRecord {
                        filename,
                        hash,
                        is_safe: verdict.is_safe,
                        scores: verdict.scores,
                        path,
                        checked_at: Utc::now(),
                        error: None,
                    },
                );
            }
        }
        for record in snapshot.entries.values() {
            entries_bump(&mut totals, record.is_safe);
        }
        snapshot.last_scan = Utc::now();
        self.persist(&snapshot).await?;
        Ok(totals)
    }

    /// Writes an uploaded file, hashes and classifies it, and inserts the
    /// record (§4.4 `upload()`). On classifier failure the file is deleted
    /// to avoid leaving an orphan untrusted artifact.
    pub async fn upload(&self, filename: &str, bytes: &[u8]) -> Result<SeedRecord, CacheError> {
        let path = Path::new(filename);
        if !wg_config::has_accepted_extension(path) {
            return Err(CacheError::UnsupportedExtension(filename.to_string()));
        }

        let dest = self.paths.uploads_dir();
        std::fs::create_dir_all(&dest)?;
        let dest_path = dest.join(filename);
        std::fs::write(&dest_path, bytes)?;

        let hash = match sha256_hex(&dest_path) {
            Ok(hash) => hash,
            Err(err) => {
                let _ = std::fs::remove_file(&dest_path);
                return Err(CacheError::Io(err));
            }
        };

        let verdict = match self.classifier.check_one(&dest_path).await {
            Ok(verdict) => verdict,
            Err(err) => {
                let _ = std::fs::remove_file(&dest_path);
                return Err(CacheError::Classifier(err));
            }
        };

        let record = SeedRecord {
            filename: filename.to_string(),
            hash,
            is_safe: verdict.is_safe,
            scores: verdict.scores,
            path: dest_path,
            checked_at: Utc::now(),
            error: None,
        };

        let mut snapshot = self.snapshot.lock().await;
        snapshot.entries.insert(filename.to_string(), record.clone());
        self.persist(&snapshot).await?;
        Ok(record)
    }

    /// Deletes an uploaded seed. Default seeds are immutable (§4.4 `delete()`).
    pub async fn delete(&self, filename: &str) -> Result<(), CacheError> {
        let mut snapshot = self.snapshot.lock().await;
        let record = snapshot.entries.get(filename).ok_or_else(|| CacheError::NotFound(filename.to_string()))?;
        if !record.path.starts_with(self.paths.uploads_dir()) {
            return Err(CacheError::DefaultSeedImmutable(filename.to_string()));
        }
        let path = record.path.clone();
        snapshot.entries.remove(filename);
        self.persist(&snapshot).await?;
        let _ = std::fs::remove_file(path);
        Ok(())
    }

    pub fn default_dir(&self) -> PathBuf {
        self.paths.default_dir()
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.paths.uploads_dir()
    }

    fn enumerate_seed_files(&self) -> Vec<PathBuf> {
        [self.paths.default_dir(), self.paths.uploads_dir()]
            .into_iter()
            .flat_map(|dir| {
                std::fs::read_dir(&dir)
                    .into_iter()
                    .flatten()
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.path())
                    .filter(|path| path.is_file())
                    .filter(|path| wg_config::has_accepted_extension(path))
            })
            .collect()
    }
}

fn filename_of(path: &Path) -> Result<String, CacheError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| CacheError::Corrupt(format!("non-utf8 path: {}", path.display())))
}

fn entries_bump(totals: &mut RescanTotals, is_safe: bool) {
    if is_safe {
        totals.safe += 1;
    } else {
        totals.unsafe_count += 1;
    }
}
