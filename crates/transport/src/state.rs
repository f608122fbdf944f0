//! Shared application state handed to every axum handler.

use std::sync::Arc;
use wg_config::SeedListPolicy;
use wg_engine::EngineOrchestrator;
use wg_persistence::SeedCache;
use wg_safety::SafetyClassifier;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<EngineOrchestrator>,
    pub seed_cache: Arc<SeedCache>,
    pub safety: Arc<SafetyClassifier>,
    pub default_seed_list_policy: SeedListPolicy,
}
