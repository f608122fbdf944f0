//! JSON wire shapes for the `/ws` channel (§6). This module is the only
//! place that knows about the on-the-wire message tags; everything else
//! works with [`wg_session::SessionEvent`] / [`wg_session::SessionOutput`].

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use wg_core::{parse_buttons, ControlInput, StatusCode};
use wg_session::{SessionEvent, SessionOutput};

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    SetModel {
        model: String,
        #[serde(default)]
        seed: Option<String>,
    },
    SetInitialSeed {
        filename: String,
    },
    Control {
        #[serde(default)]
        buttons: Vec<String>,
        #[serde(default)]
        mouse_dx: f64,
        #[serde(default)]
        mouse_dy: f64,
        #[serde(default)]
        ts: i64,
    },
    Reset,
    Prompt {
        prompt: String,
    },
    PromptWithSeed {
        filename: String,
    },
    Pause,
    Resume,
}

impl ClientMessage {
    pub fn into_event(self) -> SessionEvent {
        match self {
            Self::SetModel { model, seed } => SessionEvent::SetModel { model, seed },
            Self::SetInitialSeed { filename } => SessionEvent::SetInitialSeed { filename },
            Self::Control { buttons, mouse_dx, mouse_dy, ts } => {
                let buttons = parse_buttons(buttons.iter().map(String::as_str));
                SessionEvent::Control(ControlInput::new(buttons, mouse_dx, mouse_dy, ts))
            }
            Self::Reset => SessionEvent::Reset,
            Self::Prompt { prompt } => SessionEvent::Prompt { prompt },
            Self::PromptWithSeed { filename } => SessionEvent::PromptWithSeed { filename },
            Self::Pause => SessionEvent::Pause,
            Self::Resume => SessionEvent::Resume,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Status {
        code: StatusCode,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Frame {
        data: String,
        frame_id: u64,
        client_ts: i64,
        gen_ms: f64,
    },
    Error {
        message: String,
    },
}

impl From<SessionOutput> for ServerMessage {
    fn from(output: SessionOutput) -> Self {
        match output {
            SessionOutput::Status { code, message } => Self::Status { code, message },
            SessionOutput::Frame { jpeg, frame_id, client_ts, gen_ms } => {
                Self::Frame { data: STANDARD.encode(jpeg), frame_id, client_ts, gen_ms }
            }
            SessionOutput::Error { message } => Self::Error { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_message_parses_buttons_case_insensitively_and_drops_unknowns() {
        let raw = r#"{"type":"control","buttons":["w","FROB","up"],"mouse_dx":1.5,"mouse_dy":-2.0,"ts":42}"#;
        let parsed: ClientMessage = serde_json::from_str(raw).unwrap();
        match parsed.into_event() {
            SessionEvent::Control(input) => {
                assert_eq!(input.buttons.len(), 2);
                assert_eq!(input.mouse_dx, 1.5);
                assert_eq!(input.client_ts, 42);
            }
            _ => panic!("expected control event"),
        }
    }

    #[test]
    fn status_message_omits_message_field_when_absent() {
        let msg = ServerMessage::Status { code: StatusCode::Ready, message: None };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"type":"status","code":"ready"}"#);
    }

    #[test]
    fn frame_message_base64_encodes_jpeg_bytes() {
        let msg = ServerMessage::from(SessionOutput::Frame { jpeg: vec![1, 2, 3], frame_id: 7, client_ts: 100, gen_ms: 12.5 });
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(&format!("\"data\":\"{}\"", STANDARD.encode([1, 2, 3]))));
    }
}
