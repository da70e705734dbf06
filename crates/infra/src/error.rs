//! Caller-facing failure taxonomy of the company and account services.
//!
//! Each variant carries the exact message returned to the client. Detail of
//! dependency failures is logged where it happens and never travels here.

use thiserror::Error;

use firmhub_core::DomainError;

/// Caller-facing messages.
pub mod msg {
    pub const UNAUTHORIZED: &str = "Unauthorized";
    pub const COMPANY_NOT_FOUND: &str = "Company not found";
    pub const COMPANY_NAME_TAKEN: &str = "Company name already exists";
    pub const ERROR_CHECKING_NAME: &str = "Error checking name for uniqueness";
    pub const ERROR_CREATING_COMPANY: &str = "Error creating company";
    pub const ERROR_UPDATING_COMPANY: &str = "Error updating company";
    pub const ERROR_DELETING_COMPANY: &str = "Error deleting company";
    pub const EMAIL_TAKEN: &str = "Email already registered";
    pub const ERROR_CHECKING_EMAIL: &str = "Error checking email";
    pub const ERROR_CREATING_USER: &str = "Error creating user";
    pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
    pub const ERROR_GENERATING_TOKEN: &str = "Error generating token";
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Client input violates a business rule (400).
    #[error("{0}")]
    Validation(String),

    /// Uniqueness violation (409).
    #[error("{0}")]
    Conflict(String),

    /// Missing entity (404).
    #[error("{0}")]
    NotFound(String),

    /// Missing or rejected credentials (401).
    #[error("{0}")]
    Unauthorized(String),

    /// Storage, transport or crypto failure (500). Message is generic.
    #[error("{0}")]
    Dependency(String),
}

impl ServiceError {
    pub fn message(&self) -> &str {
        match self {
            ServiceError::Validation(m)
            | ServiceError::Conflict(m)
            | ServiceError::NotFound(m)
            | ServiceError::Unauthorized(m)
            | ServiceError::Dependency(m) => m,
        }
    }

    pub(crate) fn company_not_found() -> Self {
        ServiceError::NotFound(msg::COMPANY_NOT_FOUND.to_string())
    }

    pub(crate) fn company_name_taken() -> Self {
        ServiceError::Conflict(msg::COMPANY_NAME_TAKEN.to_string())
    }

    pub(crate) fn unauthorized() -> Self {
        ServiceError::Unauthorized(msg::UNAUTHORIZED.to_string())
    }

    pub(crate) fn invalid_credentials() -> Self {
        ServiceError::Unauthorized(msg::INVALID_CREDENTIALS.to_string())
    }

    pub(crate) fn dependency(message: &str) -> Self {
        ServiceError::Dependency(message.to_string())
    }
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        ServiceError::Validation(value.message().to_string())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
