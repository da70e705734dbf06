//! `firmhub-core`: domain model and validation rules (no IO).

pub mod company;
pub mod error;
pub mod field;
pub mod id;
pub mod user;
pub mod validation;

pub use company::{
    Company, CompanyChanges, CompanyType, CreateCompany, NewCompany, UpdateCompany,
    next_update_timestamp, timestamp_now,
};
pub use error::{DomainError, DomainResult};
pub use field::Field;
pub use id::{CompanyId, UserId};
pub use user::{LoginUser, RegisterUser, User};
