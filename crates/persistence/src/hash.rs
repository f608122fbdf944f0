//! SHA-256 content hashing for seed files.

use sha2::{Digest, Sha256};
use std::path::Path;

/// Hex-encoded SHA-256 of a file's contents.
pub fn sha256_hex(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

/// Hashes many files in parallel (§4.4 "compute SHA-256 for each (I/O-parallel)").
/// Entries whose read fails are omitted from the result.
pub fn sha256_many(paths: &[std::path::PathBuf]) -> Vec<(std::path::PathBuf, String)> {
    use rayon::prelude::*;

    paths
        .par_iter()
        .filter_map(|path| sha256_hex(path).ok().map(|hash| (path.clone(), hash)))
        .collect()
}
