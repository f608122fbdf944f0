//! Gateway configuration module.
//!
//! This module provides the configuration types for the world-engine
//! gateway daemon: transport bind address, the on-disk layout for seeds and
//! the seed cache, and the engine's default model/prompt.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default HTTP/WS bind host (§6, CLI `--host`).
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default HTTP/WS bind port (§6, CLI `--port`).
pub const DEFAULT_PORT: u16 = 7987;

/// Directory name holding pre-bundled or dev-copied seeds (§4.4).
pub const DEFAULT_SEEDS_DIR: &str = "default";
/// Directory name holding user-uploaded seeds (§4.4).
pub const UPLOADS_DIR: &str = "uploads";
/// On-disk snapshot filename for the seed cache (§4.4).
pub const SEED_CACHE_FILE: &str = ".seeds_cache.bin";

/// Layout of the persisted state under a configured root directory (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedPaths {
    pub root: PathBuf,
}

impl SeedPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn default_dir(&self) -> PathBuf {
        self.seeds_root().join(DEFAULT_SEEDS_DIR)
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.seeds_root().join(UPLOADS_DIR)
    }

    pub fn cache_file(&self) -> PathBuf {
        self.world_engine_root().join(SEED_CACHE_FILE)
    }

    fn world_engine_root(&self) -> PathBuf {
        self.root.join("world_engine")
    }

    fn seeds_root(&self) -> PathBuf {
        self.world_engine_root().join("seeds")
    }
}

impl Default for SeedPaths {
    fn default() -> Self {
        Self::new(".")
    }
}

/// Whether `GET /seeds/list` includes unsafe records (Open Question, §9).
///
/// The source has two variants; this implementation picks the conservative
/// default (safe-only) and exposes `include_unsafe` as an explicit operator
/// opt-in via the `?include_unsafe=true` query flag at the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SeedListPolicy {
    #[default]
    SafeOnly,
    IncludeUnsafe,
}

/// Top-level gateway configuration, built from CLI flags in the binary crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub seeds: SeedPaths,
    pub default_seed_list_policy: SeedListPolicy,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16, root: impl Into<PathBuf>) -> Self {
        Self {
            host: host.into(),
            port,
            seeds: SeedPaths::new(root),
            default_seed_list_policy: SeedListPolicy::SafeOnly,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT, ".")
    }
}

/// Returns true if `path`'s extension is one accepted for seed uploads (§4.4).
pub fn has_accepted_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            wg_core::constants::ACCEPTED_SEED_EXTENSIONS
                .iter()
                .any(|accepted| accepted.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_join_world_engine_root() {
        let paths = SeedPaths::new("/srv/gateway");
        assert_eq!(paths.default_dir(), PathBuf::from("/srv/gateway/world_engine/seeds/default"));
        assert_eq!(paths.uploads_dir(), PathBuf::from("/srv/gateway/world_engine/seeds/uploads"));
        assert_eq!(paths.cache_file(), PathBuf::from("/srv/gateway/world_engine/.seeds_cache.bin"));
    }

    #[test]
    fn extension_gate() {
        assert!(has_accepted_extension(Path::new("a.png")));
        assert!(has_accepted_extension(Path::new("a.JPG")));
        assert!(!has_accepted_extension(Path::new("a.gif")));
    }
}
