use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::warn;

use firmhub_core::{LoginUser, RegisterUser};

use crate::app::dto::TokenResponse;
use crate::app::errors::{self, INVALID_REQUEST_BODY};
use crate::app::services::AppServices;

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<RegisterUser>, JsonRejection>,
) -> Response {
    let Json(payload) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };

    match services.accounts.register(payload).await {
        Ok(token) => (StatusCode::OK, Json(TokenResponse { token })).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<LoginUser>, JsonRejection>,
) -> Response {
    let Json(payload) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };

    match services.accounts.login(payload).await {
        Ok(token) => (StatusCode::OK, Json(TokenResponse { token })).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub(crate) fn invalid_body(rejection: JsonRejection) -> Response {
    warn!(reason = %rejection.body_text(), "failed to decode request body");
    errors::json_error(StatusCode::BAD_REQUEST, INVALID_REQUEST_BODY)
}
