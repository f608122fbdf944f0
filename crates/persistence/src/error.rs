//! Errors surfaced by the seed cache.

use thiserror::Error;
use wg_core::GatewayError;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("seed '{0}' not found")]
    NotFound(String),

    #[error("seed '{0}' marked as unsafe")]
    Unsafe(String),

    #[error("File integrity verification failed - please rescan seeds")]
    IntegrityMismatch,

    #[error("unsupported file extension for '{0}'")]
    UnsupportedExtension(String),

    #[error("default seeds are immutable: '{0}'")]
    DefaultSeedImmutable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("classifier error: {0}")]
    Classifier(#[from] wg_safety::SafetyError),

    #[error("cache snapshot corrupt: {0}")]
    Corrupt(String),
}

impl From<CacheError> for GatewayError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::NotFound(_) | CacheError::Unsafe(_) | CacheError::IntegrityMismatch => {
                GatewayError::integrity(err.to_string())
            }
            CacheError::UnsupportedExtension(_) | CacheError::DefaultSeedImmutable(_) => {
                GatewayError::validation(err.to_string())
            }
            CacheError::Io(_) | CacheError::Classifier(_) | CacheError::Corrupt(_) => {
                GatewayError::fatal(err.to_string())
            }
        }
    }
}
