//! HTTP + WebSocket surface (§4.7, §6): translates wire messages to and
//! from [`wg_session`] events/outputs and exposes the seed-management API.

mod http;
mod state;
mod thumbnail;
mod wire;
mod ws;

pub use state::AppState;
pub use ws::ws_handler;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

/// Builds the full application router. The `node` binary owns listener
/// binding; this crate only knows how requests map to handlers.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(http::health))
        .route("/safety/check_image", post(http::check_image))
        .route("/safety/check_batch", post(http::check_batch))
        .route("/seeds/list", get(http::list_seeds))
        .route("/seeds/image/:filename", get(http::get_seed_image))
        .route("/seeds/thumbnail/:filename", get(http::get_seed_thumbnail))
        .route("/seeds/upload", post(http::upload_seed))
        .route("/seeds/rescan", post(http::rescan_seeds))
        .route("/seeds/:filename", delete(http::delete_seed))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
