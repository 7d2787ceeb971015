pub mod error;
pub mod handlers;
mod middleware;
mod state;

pub use middleware::{REQUEST_ID_HEADER, RequestContext};
pub use state::HttpState;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};

use crate::infra::assets;

use middleware::{log_responses, set_request_context};

/// Assemble the service router: front-end, export, download and health routes.
pub fn build_router(state: HttpState, max_request_bytes: usize) -> Router {
    Router::new()
        .route("/", get(assets::serve_index))
        .route("/export_pdf", post(handlers::export_pdf))
        .route("/download_pdf/{filename}", get(handlers::download_pdf))
        .route("/_health", get(handlers::health))
        .fallback(assets::serve_asset)
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_request_bytes))
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
