use std::any::Any;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tower::BoxError;
use tracing::error;

use firmhub_infra::ServiceError;

use super::dto::ErrorResponse;

pub const INVALID_REQUEST_BODY: &str = "Invalid request body";
pub const REQUEST_TIMED_OUT: &str = "Request timed out";
pub const INTERNAL_ERROR: &str = "Internal server error";

pub fn service_error_to_response(err: ServiceError) -> Response {
    let status = match &err {
        ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        ServiceError::Conflict(_) => StatusCode::CONFLICT,
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        ServiceError::Dependency(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    json_error(status, err.message())
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Maps failures raised by the tower stack (e.g. the request deadline).
pub async fn handle_middleware_error(err: BoxError) -> Response {
    if err.is::<tower::timeout::error::Elapsed>() {
        json_error(StatusCode::REQUEST_TIMEOUT, REQUEST_TIMED_OUT)
    } else {
        error!(error = %err, "unhandled middleware error");
        json_error(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR)
    }
}

/// A handler panicked: answer 500 instead of dropping the connection.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");
    error!(panic = detail, "request handler panicked");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR)
}
