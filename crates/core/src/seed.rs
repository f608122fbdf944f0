//! Seed record and class-score types (§3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Cumulative risk-class probabilities produced by the safety classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassScores {
    pub neutral: f64,
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

impl ClassScores {
    /// `is_safe = scores.low < 0.5` (§4.3). This policy must not be weakened.
    pub fn is_safe(&self) -> bool {
        self.low < 0.5
    }

    /// Score profile assigned to images that failed to decode (§4.3).
    pub fn unreadable() -> Self {
        Self { neutral: 0.0, low: 1.0, medium: 0.0, high: 0.0 }
    }
}

/// One entry in the seed cache, keyed externally by filename.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedRecord {
    pub filename: String,
    /// Hex-encoded SHA-256 of the file contents at classification time.
    pub hash: String,
    pub is_safe: bool,
    pub scores: ClassScores,
    pub path: PathBuf,
    pub checked_at: DateTime<Utc>,
    pub error: Option<String>,
}

impl SeedRecord {
    pub fn is_default(&self, default_dir: &std::path::Path) -> bool {
        self.path.starts_with(default_dir)
    }
}
