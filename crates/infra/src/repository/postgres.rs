//! PostgreSQL-backed repositories.
//!
//! Schema is created on connect ([`ensure_schema`]). Uniqueness of
//! `companies.name` and `users.email` is enforced by `UNIQUE` constraints, so a
//! duplicate that slips past a caller's pre-check surfaces as
//! [`RepositoryError::Conflict`] (SQLSTATE `23505`).

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;

use firmhub_core::{Company, CompanyId, User};

use super::rows::{CompanyRow, UserRow};
use super::{
    CompanyRepository, RepositoryError, RepositoryResult, UserRepository, map_sqlx_error,
};

const SCHEMA: [&str; 2] = [
    r#"
    CREATE TABLE IF NOT EXISTS companies (
        id UUID PRIMARY KEY,
        name VARCHAR(15) NOT NULL UNIQUE,
        description TEXT,
        employee_count INTEGER NOT NULL,
        registered BOOLEAN NOT NULL,
        type VARCHAR(32) NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        email VARCHAR(255) NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )
    "#,
];

/// Create the `companies` and `users` tables if they do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> RepositoryResult<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct PostgresCompanyRepository {
    pool: Arc<PgPool>,
}

impl PostgresCompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl CompanyRepository for PostgresCompanyRepository {
    #[instrument(skip(self, company), fields(company_id = %company.id), err)]
    async fn create(&self, company: &Company) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO companies
                (id, name, description, employee_count, registered, type, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(company.id.as_uuid())
        .bind(&company.name)
        .bind(company.description.as_deref())
        .bind(company.employee_count)
        .bind(company.registered)
        .bind(company.company_type.as_str())
        .bind(company.created_at)
        .bind(company.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_company", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(company_id = %id), err)]
    async fn get_by_id(&self, id: CompanyId) -> RepositoryResult<Option<Company>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, employee_count, registered, type, created_at, updated_at
            FROM companies
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_company", e))?;

        row.map(|row| {
            let row = CompanyRow::from_row(&row).map_err(|e| map_sqlx_error("get_company", e))?;
            Company::try_from(row)
        })
        .transpose()
    }

    #[instrument(skip(self, company), fields(company_id = %company.id), err)]
    async fn update(&self, company: &Company) -> RepositoryResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE companies
            SET name = $2, description = $3, employee_count = $4, registered = $5, type = $6,
                updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(company.id.as_uuid())
        .bind(&company.name)
        .bind(company.description.as_deref())
        .bind(company.employee_count)
        .bind(company.registered)
        .bind(company.company_type.as_str())
        .bind(company.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_company", e))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(company_id = %id), err)]
    async fn delete(&self, id: CompanyId) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_company", e))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn exists_by_name(&self, name: &str) -> RepositoryResult<bool> {
        sqlx::query("SELECT EXISTS(SELECT 1 FROM companies WHERE name = $1)")
            .bind(name)
            .fetch_one(&*self.pool)
            .await
            .and_then(|row| row.try_get::<bool, _>(0))
            .map_err(|e| map_sqlx_error("company_exists_by_name", e))
    }
}

#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: Arc<PgPool>,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn create(&self, user: &User) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_user", e))?;
        Ok(())
    }

    #[instrument(skip(self, email), err)]
    async fn get_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_user_by_email", e))?;

        row.map(|row| {
            UserRow::from_row(&row)
                .map(User::from)
                .map_err(|e| map_sqlx_error("get_user_by_email", e))
        })
        .transpose()
    }

    #[instrument(skip(self, email), err)]
    async fn exists_by_email(&self, email: &str) -> RepositoryResult<bool> {
        sqlx::query("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&*self.pool)
            .await
            .and_then(|row| row.try_get::<bool, _>(0))
            .map_err(|e| map_sqlx_error("user_exists_by_email", e))
    }
}

impl<'r> FromRow<'r, PgRow> for CompanyRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(CompanyRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            employee_count: row.try_get("employee_count")?,
            registered: row.try_get("registered")?,
            company_type: row.try_get("type")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
