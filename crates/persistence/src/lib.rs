//! Seed safety cache (§4.4): a content-addressed, on-disk index over the
//! seed images a session can select, built on the classifier contract from
//! `wg-safety`.

mod cache;
mod error;
mod hash;
mod snapshot;

pub use cache::{RescanTotals, SeedCache};
pub use error::CacheError;
pub use hash::{sha256_hex, sha256_many};
pub use snapshot::SeedCacheSnapshot;
