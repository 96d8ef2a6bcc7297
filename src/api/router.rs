//! Router setup and configuration.

use axum::{Router, routing::get};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::handlers::{health, kv};
use crate::api::state::AppState;

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    // Key/value protocol, addressed by the `key` query parameter
    let kv_routes = Router::new().route(
        "/",
        get(kv::get_item).post(kv::set_item).delete(kv::delete_item),
    );

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/metrics", get(health::metrics));

    Router::new()
        .merge(kv_routes)
        .merge(health_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
