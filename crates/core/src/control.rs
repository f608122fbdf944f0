//! Control input accumulated from `control` messages (§3).

use crate::button::Button;
use std::collections::HashSet;

/// A single control sample: the set of currently held buttons, a mouse
/// delta, and the client's own timestamp (echoed back for RTT telemetry).
#[derive(Debug, Clone, PartialEq)]
pub struct ControlInput {
    pub buttons: HashSet<Button>,
    pub mouse_dx: f64,
    pub mouse_dy: f64,
    pub client_ts: i64,
}

impl ControlInput {
    pub fn new(buttons: Vec<Button>, mouse_dx: f64, mouse_dy: f64, client_ts: i64) -> Self {
        Self { buttons: buttons.into_iter().collect(), mouse_dx, mouse_dy, client_ts }
    }
}
