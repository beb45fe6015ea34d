//! API module
//!
//! HTTP API endpoints and middleware.

pub mod extract;
pub mod middleware;
pub mod routes;

use axum::{
    http::{header, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub use routes::{create_router, public_router};

/// Browser clients may call from any origin; credentials travel in the
/// Authorization header, never in cookies.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::HeaderName::from_static(middleware::CORRELATION_ID_HEADER),
        ])
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let protected_routes = create_router(&state).layer(from_fn_with_state(
        state.clone(),
        middleware::auth_middleware,
    ));

    // ServiceBuilder runs top to bottom: trace -> cors -> logging -> auth -> gates
    Router::new()
        // Health check (no auth)
        .route("/health", get(health_check))
        .merge(public_router())
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer())
                .layer(from_fn(middleware::logging_middleware)),
        )
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
