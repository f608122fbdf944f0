//! Seed verification on every use (§4.5): before the engine is handed a
//! seed — at handshake, on `prompt_with_seed`, or on model switch — the
//! session must confirm, in order: (1) the filename is cached, (2) its
//! verdict is safe, (3) the file still exists, (4) re-hashing it still
//! matches the cached hash.

use std::path::PathBuf;
use wg_persistence::{CacheError, SeedCache};

pub async fn verify_seed_for_use(cache: &SeedCache, filename: &str) -> Result<PathBuf, CacheError> {
    let record = cache.get(filename).await.ok_or_else(|| CacheError::NotFound(filename.to_string()))?;

    if !record.is_safe {
        return Err(CacheError::Unsafe(filename.to_string()));
    }

    if !record.path.exists() {
        return Err(CacheError::NotFound(filename.to_string()));
    }

    let current_hash = wg_persistence::sha256_hex(&record.path)?;
    if current_hash != record.hash {
        return Err(CacheError::IntegrityMismatch);
    }

    Ok(record.path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Arc;
    use wg_config::SeedPaths;
    use wg_safety::{ClassifierBackend, DecodedImage, Device, LoadedClassifier, SafetyClassifier, SafetyError};

    struct FixedVerdict {
        low: f64,
    }

    impl LoadedClassifier for FixedVerdict {
        fn infer(&self, _image: &DecodedImage) -> wg_core::ClassScores {
            wg_core::ClassScores { neutral: 1.0 - self.low, low: self.low, medium: 0.0, high: 0.0 }
        }
    }

    struct FixedBackend {
        low: f64,
    }

    #[async_trait]
    impl ClassifierBackend for FixedBackend {
        fn device(&self) -> Device {
            Device::Cpu
        }
        async fn load(&self) -> Result<Box<dyn LoadedClassifier>, SafetyError> {
            Ok(Box::new(FixedVerdict { low: self.low }))
        }
        async fn decode(&self, _path: &Path) -> Result<DecodedImage, SafetyError> {
            Ok(DecodedImage { width: 1, height: 1, rgb8: vec![0] })
        }
    }

    #[tokio::test]
    async fn unsafe_seed_is_rejected_even_if_hash_matches() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SeedPaths::new(dir.path());
        std::fs::create_dir_all(paths.default_dir()).unwrap();
        std::fs::write(paths.default_dir().join("risky.png"), b"data").unwrap();

        let classifier = Arc::new(SafetyClassifier::new(Arc::new(FixedBackend { low: 0.9 })));
        let cache = SeedCache::load(paths, classifier);
        cache.rescan().await.unwrap();

        let err = verify_seed_for_use(&cache, "risky.png").await.unwrap_err();
        assert!(matches!(err, CacheError::Unsafe(_)));
    }

    #[tokio::test]
    async fn unknown_filename_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SeedPaths::new(dir.path());
        let classifier = Arc::new(SafetyClassifier::new(Arc::new(FixedBackend { low: 0.1 })));
        let cache = SeedCache::load(paths, classifier);

        let err = verify_seed_for_use(&cache, "nope.png").await.unwrap_err();
        assert!(matches!(err, CacheError::NotFound(_)));
    }

    #[tokio::test]
    async fn tampered_file_fails_integrity_check() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SeedPaths::new(dir.path());
        std::fs::create_dir_all(paths.default_dir()).unwrap();
        let seed_path = paths.default_dir().join("a.png");
        std::fs::write(&seed_path, b"original").unwrap();

        let classifier = Arc::new(SafetyClassifier::new(Arc::new(FixedBackend { low: 0.1 })));
        let cache = SeedCache::load(paths, classifier);
        cache.rescan().await.unwrap();

        std::fs::write(&seed_path, b"tampered").unwrap();
        let err = verify_seed_for_use(&cache, "a.png").await.unwrap_err();
        assert!(matches!(err, CacheError::IntegrityMismatch));
    }
}
