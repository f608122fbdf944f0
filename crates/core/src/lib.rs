//! # World Engine Gateway — Core
//!
//! Shared domain types and error taxonomy used by every other crate in the
//! gateway: the button table, control input, seed records, session states,
//! and the engine's process-wide runtime state.

pub mod button;
pub mod constants;
pub mod control;
pub mod engine_state;
pub mod error;
pub mod seed;
pub mod session;

pub use button::{parse_buttons, Button};
pub use control::ControlInput;
pub use engine_state::EngineRuntimeState;
pub use error::{GatewayError, GatewayResult};
pub use seed::{ClassScores, SeedRecord};
pub use session::{Session, SessionState, StatusCode};
