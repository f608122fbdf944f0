//! Process-wide engine runtime state (§3). Exclusively owned and mutated by
//! the orchestrator in `wg-engine`; sessions hold no references to it.

/// Snapshot of what the singleton engine is currently doing, used for the
/// `/health` endpoint and the orchestrator's own bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct EngineRuntimeState {
    pub loaded_model: Option<String>,
    pub has_seed: bool,
    pub current_prompt: Option<String>,
    pub warmed_up: bool,
    pub loading: bool,
}

impl EngineRuntimeState {
    pub fn is_loaded(&self, model_uri: &str) -> bool {
        self.loaded_model.as_deref() == Some(model_uri)
    }

    pub fn clear_seed(&mut self) {
        self.has_seed = false;
    }
}
