//! Per-connection session state machine (§4.5): handshake, warmup,
//! ready/running, pause, reset, and recovery transitions, plus
//! control-message coalescing so a slow engine never falls behind a fast
//! input source.

mod coalesce;
mod driver;
mod event;
mod fsm;
mod output;
mod seed_verify;

pub use coalesce::{coalesce, try_drain_all};
pub use driver::SessionDriver;
pub use event::SessionEvent;
pub use output::SessionOutput;
pub use seed_verify::verify_seed_for_use;
