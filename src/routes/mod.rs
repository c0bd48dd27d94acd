mod health;
mod predict;

use crate::server::SharedState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

pub use predict::MAX_IMAGE_BYTES;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health::healthcheck))
        .route("/predict/{plant}", post(predict::predict))
        // Leave headroom over the 5 MiB image limit so the handler rejects
        // oversized uploads with its own error instead of a generic 413.
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 1024 * 1024))
}

async fn index() -> &'static str {
    "Plant disease prediction service"
}
