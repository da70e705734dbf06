//! Registration and login flows. Both answer with a freshly issued credential.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, instrument, warn};

use firmhub_auth::{JwtIssuer, PasswordHasher};
use firmhub_core::validation::{validate_login, validate_registration};
use firmhub_core::{LoginUser, RegisterUser, User, UserId};

use crate::error::{ServiceError, ServiceResult, msg};
use crate::repository::{RepositoryError, UserRepository};

pub struct AccountService<U> {
    users: U,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn JwtIssuer>,
}

impl<U> AccountService<U>
where
    U: UserRepository,
{
    pub fn new(users: U, hasher: Arc<dyn PasswordHasher>, tokens: Arc<dyn JwtIssuer>) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    #[instrument(skip_all, fields(email = %payload.email))]
    pub async fn register(&self, payload: RegisterUser) -> ServiceResult<String> {
        validate_registration(&payload).inspect_err(|e| {
            warn!(reason = %e, "registration validation failed");
        })?;

        match self.users.exists_by_email(&payload.email).await {
            Ok(false) => {}
            Ok(true) => {
                warn!("email already registered");
                return Err(ServiceError::Conflict(msg::EMAIL_TAKEN.to_string()));
            }
            Err(e) => {
                error!(error = %e, "failed to check email");
                return Err(ServiceError::dependency(msg::ERROR_CHECKING_EMAIL));
            }
        }

        let password_hash = self.hasher.hash(&payload.password).map_err(|e| {
            error!(error = %e, "failed to hash password");
            ServiceError::dependency(msg::ERROR_CREATING_USER)
        })?;

        let user = User::register(payload.name, payload.email, password_hash, Utc::now());
        self.users.create(&user).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => {
                warn!("email registered concurrently");
                ServiceError::Conflict(msg::EMAIL_TAKEN.to_string())
            }
            other => {
                error!(error = %other, "failed to create user");
                ServiceError::dependency(msg::ERROR_CREATING_USER)
            }
        })?;

        info!(user_id = %user.id, "user registered");
        self.issue(user.id)
    }

    #[instrument(skip_all, fields(email = %payload.email))]
    pub async fn login(&self, payload: LoginUser) -> ServiceResult<String> {
        validate_login(&payload).inspect_err(|e| {
            warn!(reason = %e, "login validation failed");
        })?;

        let user = match self.users.get_by_email(&payload.email).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                warn!("login for unknown email");
                return Err(ServiceError::invalid_credentials());
            }
            Err(e) => {
                error!(error = %e, "failed to load user");
                return Err(ServiceError::invalid_credentials());
            }
        };

        match self.hasher.verify(&payload.password, &user.password_hash) {
            Ok(true) => {}
            Ok(false) => {
                warn!(user_id = %user.id, "wrong password");
                return Err(ServiceError::invalid_credentials());
            }
            Err(e) => {
                error!(user_id = %user.id, error = %e, "stored password hash unusable");
                return Err(ServiceError::invalid_credentials());
            }
        }

        info!(user_id = %user.id, "user logged in");
        self.issue(user.id)
    }

    fn issue(&self, user_id: UserId) -> ServiceResult<String> {
        self.tokens.issue(user_id).map_err(|e| {
            error!(%user_id, error = %e, "failed to issue token");
            ServiceError::dependency(msg::ERROR_GENERATING_TOKEN)
        })
    }
}
