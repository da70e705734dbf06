use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::middleware::{self, AuthState};

pub mod auth;
pub mod companies;
pub mod system;

/// Router for every endpoint except `/health`.
///
/// Company mutations sit behind the auth gate; the company read and the
/// credential endpoints are public.
pub fn router(auth_state: AuthState) -> Router {
    let gate = axum::middleware::from_fn_with_state(auth_state, middleware::auth_middleware);

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route(
            "/companies",
            post(companies::create_company).route_layer(gate.clone()),
        )
        .route(
            "/companies/:id",
            get(companies::get_company).merge(
                patch(companies::update_company)
                    .delete(companies::delete_company)
                    .route_layer(gate),
            ),
        )
}
