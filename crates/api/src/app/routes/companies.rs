use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use firmhub_core::{CompanyId, CreateCompany, UpdateCompany};
use firmhub_infra::ServiceError;

use crate::app::errors;
use crate::app::routes::auth::invalid_body;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

/// Mutating handlers forward the gate's principal (if any) and leave the
/// authorization decision to the service.
pub async fn create_company(
    Extension(services): Extension<Arc<AppServices>>,
    principal: Option<Extension<PrincipalContext>>,
    body: Result<Json<CreateCompany>, JsonRejection>,
) -> Response {
    let actor = principal.map(|Extension(p)| p.user_id());

    let Json(payload) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };

    match services.companies.create(actor, payload).await {
        Ok(company) => (StatusCode::CREATED, Json(company)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_company(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let Some(id) = parse_id(&id) else {
        return errors::service_error_to_response(not_found());
    };

    match services.companies.get(id).await {
        Ok(company) => Json(company).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_company(
    Extension(services): Extension<Arc<AppServices>>,
    principal: Option<Extension<PrincipalContext>>,
    Path(id): Path<String>,
    body: Result<Json<UpdateCompany>, JsonRejection>,
) -> Response {
    let actor = principal.map(|Extension(p)| p.user_id());

    let Json(payload) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };

    let Some(id) = parse_id(&id) else {
        return errors::service_error_to_response(not_found());
    };

    match services.companies.update(actor, id, payload).await {
        Ok(company) => Json(company).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_company(
    Extension(services): Extension<Arc<AppServices>>,
    principal: Option<Extension<PrincipalContext>>,
    Path(id): Path<String>,
) -> Response {
    let actor = principal.map(|Extension(p)| p.user_id());

    let Some(id) = parse_id(&id) else {
        return errors::service_error_to_response(not_found());
    };

    match services.companies.delete(actor, id).await {
        Ok(company) => Json(company).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Ids that do not parse cannot name a stored company.
fn parse_id(raw: &str) -> Option<CompanyId> {
    raw.parse().ok()
}

fn not_found() -> ServiceError {
    ServiceError::NotFound(firmhub_infra::error::msg::COMPANY_NOT_FOUND.to_string())
}
