//! The fixed button table accepted on the `control` message (§6).

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A single recognized button code. Names are case-insensitive on the wire;
/// unknown names are silently dropped by the caller rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Button {
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
    N0, N1, N2, N3, N4, N5, N6, N7, N8, N9,
    Up, Down, Left, Right,
    Shift, Ctrl, Space, Tab, Enter,
    MouseLeft, MouseRight, MouseMiddle,
}

impl FromStr for Button {
    type Err = ();

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let upper = raw.to_ascii_uppercase();
        Ok(match upper.as_str() {
            "A" => Self::A, "B" => Self::B, "C" => Self::C, "D" => Self::D,
            "E" => Self::E, "F" => Self::F, "G" => Self::G, "H" => Self::H,
            "I" => Self::I, "J" => Self::J, "K" => Self::K, "L" => Self::L,
            "M" => Self::M, "N" => Self::N, "O" => Self::O, "P" => Self::P,
            "Q" => Self::Q, "R" => Self::R, "S" => Self::S, "T" => Self::T,
            "U" => Self::U, "V" => Self::V, "W" => Self::W, "X" => Self::X,
            "Y" => Self::Y, "Z" => Self::Z,
            "0" => Self::N0, "1" => Self::N1, "2" => Self::N2, "3" => Self::N3,
            "4" => Self::N4, "5" => Self::N5, "6" => Self::N6, "7" => Self::N7,
            "8" => Self::N8, "9" => Self::N9,
            "UP" => Self::Up, "DOWN" => Self::Down, "LEFT" => Self::Left, "RIGHT" => Self::Right,
            "SHIFT" => Self::Shift, "CTRL" => Self::Ctrl, "SPACE" => Self::Space,
            "TAB" => Self::Tab, "ENTER" => Self::Enter,
            "MOUSE_LEFT" => Self::MouseLeft,
            "MOUSE_RIGHT" => Self::MouseRight,
            "MOUSE_MIDDLE" => Self::MouseMiddle,
            _ => return Err(()),
        })
    }
}

/// Parses a list of button names, silently dropping unrecognized ones (§6).
pub fn parse_buttons<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<Button> {
    names.into_iter().filter_map(|name| Button::from_str(name).ok()).collect()
}
