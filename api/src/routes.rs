use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::auth_middleware;
use crate::state::AppState;

/// Create the main application router with all routes and middleware
#[tracing::instrument(skip(state))]
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no authentication required)
    let public_routes = Router::new().route("/health", get(handlers::health::health_check));

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/api/v2/execute", post(handlers::jobs::execute))
        .route("/api/v2/job/:id", get(handlers::jobs::get_job))
        .route("/api/v2/job/:id/bindings", get(handlers::jobs::get_bindings))
        .route("/api/v2/preview/query", post(handlers::preview::preview_query))
        .route("/api/v2/preview/file", post(handlers::preview::preview_file))
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        )));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
