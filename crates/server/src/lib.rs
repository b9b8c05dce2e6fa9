pub mod handler;
pub mod middleware;
pub mod relay;

use axum::extract::DefaultBodyLimit;
use axum::{Router, middleware as axum_mw};
use relay_core::config::Config;
use relay_core::profile::ProfileRegistry;
use relay_provider::Forward;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<ProfileRegistry>,
    pub forwarder: Arc<dyn Forward>,
}

pub fn build_router(state: AppState) -> Router {
    let body_limit_bytes = state.config.body_limit_mb.saturating_mul(1024 * 1024);

    // `/` lists profiles; every other path starts with a profile segment.
    let relay_routes = Router::new()
        .route("/", axum::routing::get(handler::index::index))
        .route("/{*path}", axum::routing::any(handler::proxy::proxy))
        .layer(DefaultBodyLimit::max(body_limit_bytes));

    // Global middleware layers (outer → inner): trace, CORS, context, logging.
    Router::new()
        .merge(relay_routes)
        .layer(axum_mw::from_fn(
            middleware::request_logging::request_logging_middleware,
        ))
        .layer(axum_mw::from_fn(
            middleware::request_context::request_context_middleware,
        ))
        .layer(axum_mw::from_fn(middleware::cors::cors_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
