//! Domain-level inbound events (§6 client → server message types), decoupled
//! from their JSON wire shape so this crate does not depend on the
//! transport layer.

use wg_core::ControlInput;

#[derive(Debug, Clone)]
pub enum SessionEvent {
    SetModel { model: String, seed: Option<String> },
    SetInitialSeed { filename: String },
    Control(ControlInput),
    Reset,
    Prompt { prompt: String },
    PromptWithSeed { filename: String },
    Pause,
    Resume,
}

impl SessionEvent {
    pub fn is_control(&self) -> bool {
        matches!(self, Self::Control(_))
    }
}
