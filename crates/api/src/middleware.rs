use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::{Instrument, Span, field, info, info_span, warn};
use uuid::Uuid;

use firmhub_auth::JwtValidator;
use firmhub_infra::error::msg;

use crate::app::errors::json_error;
use crate::context::PrincipalContext;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

/// Bearer-token gate for mutating routes.
///
/// Missing, malformed, badly signed and expired credentials all get the same
/// 401 so the response does not reveal which check failed.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let unauthorized = || json_error(StatusCode::UNAUTHORIZED, msg::UNAUTHORIZED);

    let token = extract_bearer(req.headers()).ok_or_else(|| {
        warn!("missing or malformed authorization header");
        unauthorized()
    })?;

    let user_id = state.jwt.validate(token).map_err(|e| {
        warn!(reason = %e, "credential rejected");
        unauthorized()
    })?;

    Span::current().record("user_id", field::display(user_id));
    req.extensions_mut().insert(PrincipalContext::new(user_id));

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let token = header.to_str().ok()?.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

/// Runs every request inside an `http_request` span and logs its outcome.
///
/// The request id comes from an inbound `x-request-id` header or is generated,
/// and is echoed on the response.
pub async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::now_v7().to_string());

    let span = info_span!(
        "http_request",
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path(),
        user_id = field::Empty,
    );

    let started = Instant::now();
    let mut response = next.run(req).instrument(span.clone()).await;
    let latency_ms = started.elapsed().as_millis() as u64;

    span.in_scope(|| {
        info!(status = response.status().as_u16(), latency_ms, "request completed");
    });

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
    response
}
