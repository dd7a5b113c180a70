//! API route configuration.

use std::any::Any;
use std::sync::Arc;

use axum::{
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;

use crate::error::ApiError;
use crate::handlers;
use crate::logging::log_requests;
use crate::state::AppState;

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(%detail, "Handler panicked");
    ApiError::internal().into_response()
}

/// Creates the API router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))

        // Registrations
        .route(
            "/api/registrations",
            get(handlers::list_registrations).post(handlers::create_registration),
        )
        .route(
            "/api/registrations/:id",
            get(handlers::get_registration)
                .patch(handlers::update_registration)
                .delete(handlers::delete_registration),
        )

        // Dashboard
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/export", get(handlers::export_registrations))
        .route("/api/committees", get(handlers::list_committees))

        .fallback(handlers::not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn(log_requests))
}
