//! `firmhub-auth`: credential issuing/verification and password hashing.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod claims;
pub mod config;
pub mod password;
pub mod token;

pub use claims::{Claims, TokenValidationError, validate_claims};
pub use config::AuthConfig;
pub use password::{Argon2PasswordHasher, PasswordError, PasswordHasher};
pub use token::{Hs256JwtService, JwtIssuer, JwtValidator, TokenError};
