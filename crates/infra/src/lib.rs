//! Infrastructure layer: services, storage backends, event transport, config.

pub mod account_service;
pub mod company_service;
pub mod config;
pub mod db;
pub mod error;
pub mod event_bus;
pub mod repository;

pub use account_service::AccountService;
pub use company_service::CompanyService;
pub use config::{AppConfig, ConfigError, DatabaseConfig, DatabaseDialect, EventBusKind};
pub use db::{Repositories, connect};
pub use error::{ServiceError, ServiceResult};
pub use repository::{CompanyRepository, RepositoryError, UserRepository};
