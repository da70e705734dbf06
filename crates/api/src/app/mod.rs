//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: storage/transport/credential wiring
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;
use std::time::Duration;

use axum::{Extension, Router, error_handling::HandleErrorLayer, routing::get};
use tower::ServiceBuilder;
use tower::timeout::TimeoutLayer;
use tower_http::catch_panic::CatchPanicLayer;

use crate::middleware::{self, AuthState};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(
    services: Arc<AppServices>,
    auth_state: AuthState,
    request_timeout: Duration,
) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router(auth_state))
        .layer(Extension(services))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::request_logger))
                .layer(CatchPanicLayer::custom(errors::handle_panic))
                .layer(HandleErrorLayer::new(errors::handle_middleware_error))
                .layer(TimeoutLayer::new(request_timeout)),
        )
}
