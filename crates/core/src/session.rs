//! Session state machine types (§4.5). The transition logic itself lives in
//! `wg-session`; this crate only defines the states and status vocabulary so
//! that `wg-transport` can serialize them without depending on the FSM crate.

use serde::{Deserialize, Serialize};

/// States of the per-connection session FSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingHandshake,
    Loading,
    AwaitingSeed,
    SeedVerified,
    Warming,
    Ready,
    Running,
    Resetting,
    Paused,
    Recovering,
    Closed,
}

/// Status codes emitted to the client on entry to selected states (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCode {
    WaitingForSeed,
    Loading,
    Warmup,
    Init,
    Ready,
    Reset,
}

/// Per-connection state (§3). The client identity and socket are owned by
/// the transport layer; this struct tracks only FSM-relevant counters.
#[derive(Debug, Clone)]
pub struct Session {
    pub remote_addr: String,
    pub state: SessionState,
    pub frame_count: u32,
    pub paused: bool,
    pub last_frame_id: Option<u64>,
}

impl Session {
    pub fn new(remote_addr: String) -> Self {
        Self {
            remote_addr,
            state: SessionState::AwaitingHandshake,
            frame_count: 0,
            paused: false,
            last_frame_id: None,
        }
    }

    /// Whether the next control-driven generation must be preceded by an
    /// autonomous reset (§4.5, §8 invariant 3).
    pub fn at_frame_ceiling(&self) -> bool {
        self.frame_count >= crate::constants::FRAME_CEILING
    }

    pub fn note_frame(&mut self, frame_id: u64) {
        self.frame_count += 1;
        self.last_frame_id = Some(frame_id);
    }

    pub fn note_reset(&mut self) {
        self.frame_count = 0;
    }
}
