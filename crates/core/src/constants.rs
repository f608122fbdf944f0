//! Fixed dimensions and budgets dictated by the engine contract (§2, §4.2, §4.5).

/// Native frame height the engine reads and writes.
pub const FRAME_HEIGHT: u32 = 360;
/// Native frame width the engine reads and writes.
pub const FRAME_WIDTH: u32 = 640;

/// Rolling-buffer capacity in the reference configuration.
pub const N_FRAMES: u32 = 4096;

/// A session auto-resets when its frame counter reaches this ceiling.
pub const FRAME_CEILING: u32 = N_FRAMES - 2;

/// Handshake timeout before a session is closed with an error (§5).
pub const HANDSHAKE_TIMEOUT_SECS: u64 = 60;

/// Minimum cadence for `loading` status emissions while a model load is in flight (§4.5).
pub const LOAD_STATUS_INTERVAL_SECS: u64 = 5;

/// Thumbnail dimensions served by `/seeds/thumbnail/{filename}` (§6).
pub const THUMBNAIL_SIZE: u32 = 80;

/// Default text prompt used when a client sends an empty `prompt` (§6).
pub const DEFAULT_PROMPT: &str = "";

/// Extensions accepted for seed uploads (§4.4).
pub const ACCEPTED_SEED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];
