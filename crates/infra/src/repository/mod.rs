//! Storage capabilities consumed by the company and account services.
//!
//! One trait per entity, several interchangeable backends selected at startup.
//! Every backend enforces name/email uniqueness itself and reports a violation
//! as [`RepositoryError::Conflict`], independent of any pre-check done by
//! callers.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use firmhub_core::{Company, CompanyId, User};

pub mod in_memory;
pub mod mysql;
pub mod postgres;
mod rows;
pub mod sqlite;

pub use in_memory::{InMemoryCompanyRepository, InMemoryUserRepository};
pub use mysql::{MySqlCompanyRepository, MySqlUserRepository};
pub use postgres::{PostgresCompanyRepository, PostgresUserRepository};
pub use sqlite::{SqliteCompanyRepository, SqliteUserRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The targeted row does not exist (zero rows affected).
    #[error("record not found")]
    NotFound,

    /// A storage-level uniqueness constraint rejected the write.
    #[error("unique constraint violated: {0}")]
    Conflict(String),

    /// Driver, transport or data-mapping failure.
    #[error("storage error: {0}")]
    Storage(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Company storage: {Create, GetByID, Update, Delete, ExistsByName}.
#[async_trait]
pub trait CompanyRepository: Send + Sync {
    async fn create(&self, company: &Company) -> RepositoryResult<()>;

    async fn get_by_id(&self, id: CompanyId) -> RepositoryResult<Option<Company>>;

    /// Overwrite every mutable column of the row with `company.id`.
    async fn update(&self, company: &Company) -> RepositoryResult<()>;

    async fn delete(&self, id: CompanyId) -> RepositoryResult<()>;

    async fn exists_by_name(&self, name: &str) -> RepositoryResult<bool>;
}

/// User storage: {Create, GetByEmail, ExistsByEmail}.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> RepositoryResult<()>;

    async fn get_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;

    async fn exists_by_email(&self, email: &str) -> RepositoryResult<bool>;
}

#[async_trait]
impl<R> CompanyRepository for Arc<R>
where
    R: CompanyRepository + ?Sized,
{
    async fn create(&self, company: &Company) -> RepositoryResult<()> {
        (**self).create(company).await
    }

    async fn get_by_id(&self, id: CompanyId) -> RepositoryResult<Option<Company>> {
        (**self).get_by_id(id).await
    }

    async fn update(&self, company: &Company) -> RepositoryResult<()> {
        (**self).update(company).await
    }

    async fn delete(&self, id: CompanyId) -> RepositoryResult<()> {
        (**self).delete(id).await
    }

    async fn exists_by_name(&self, name: &str) -> RepositoryResult<bool> {
        (**self).exists_by_name(name).await
    }
}

#[async_trait]
impl<R> UserRepository for Arc<R>
where
    R: UserRepository + ?Sized,
{
    async fn create(&self, user: &User) -> RepositoryResult<()> {
        (**self).create(user).await
    }

    async fn get_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        (**self).get_by_email(email).await
    }

    async fn exists_by_email(&self, email: &str) -> RepositoryResult<bool> {
        (**self).exists_by_email(email).await
    }
}

/// Map a sqlx error for `operation` onto the repository taxonomy.
///
/// | sqlx error | Code | RepositoryError |
/// |---|---|---|
/// | Database (unique violation) | see below | `Conflict` |
/// | RowNotFound | n/a | `NotFound` |
/// | anything else | n/a | `Storage` |
///
/// Unique violations: `23505` on Postgres, `1062` on MySQL, `2067`/`1555` on SQLite.
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            if db_err.is_unique_violation() {
                RepositoryError::Conflict(msg)
            } else {
                RepositoryError::Storage(msg)
            }
        }
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        sqlx::Error::PoolClosed => {
            RepositoryError::Storage(format!("connection pool closed in {}", operation))
        }
        _ => RepositoryError::Storage(format!("sqlx error in {}: {}", operation, err)),
    }
}
