//! Domain-level outbound events (§6 server → client message types).

use wg_core::StatusCode;

#[derive(Debug, Clone)]
pub enum SessionOutput {
    Status { code: StatusCode, message: Option<String> },
    Frame { jpeg: Vec<u8>, frame_id: u64, client_ts: i64, gen_ms: f64 },
    Error { message: String },
}
