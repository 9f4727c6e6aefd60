//! API layer - HTTP and WebSocket entry points.

pub mod http;
pub mod websocket;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use crate::app::App;

/// Assemble the full route tree.
pub fn router(app: Arc<App>) -> Router {
    Router::new()
        .merge(http::routes())
        .route("/ws/progress/{user_id}", get(websocket::ws_handler))
        .with_state(app)
}
