use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.max_upload_size as usize;

    Router::new()
        // Collection
        .route("/shopping-list", get(handlers::list_items))
        .route(
            "/shopping-list",
            post(handlers::create_item).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/shopping-list/:id", delete(handlers::delete_item))
        .route("/shopping-list/:id", patch(handlers::patch_item))
        .route(
            "/shopping-list/:id",
            put(handlers::update_item).layer(DefaultBodyLimit::max(upload_limit)),
        )
        // Stored images (raw byte passthrough)
        .route("/uploads/:filename", get(handlers::serve_upload))
        .fallback(handlers::route_not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
