//! MySQL-backed repositories.
//!
//! Ids are `CHAR(36)` hyphenated text; timestamps are `DATETIME(6)` in UTC
//! (sqlx pins the session time zone to `+00:00`). `name` and `email` use a
//! binary collation so uniqueness is case-sensitive, as on the other backends.
//! A duplicate surfaces as [`RepositoryError::Conflict`] (error `1062`).

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::mysql::MySqlRow;
use sqlx::{FromRow, MySqlPool, Row};
use tracing::instrument;

use firmhub_core::{Company, CompanyId, User};

use super::rows::{CompanyRow, UserRow, uuid_from_text};
use super::{
    CompanyRepository, RepositoryError, RepositoryResult, UserRepository, map_sqlx_error,
};

const SCHEMA: [&str; 2] = [
    r#"
    CREATE TABLE IF NOT EXISTS companies (
        id CHAR(36) NOT NULL PRIMARY KEY,
        name VARCHAR(15) COLLATE utf8mb4_bin NOT NULL UNIQUE,
        description TEXT,
        employee_count INT NOT NULL,
        registered BOOLEAN NOT NULL,
        type VARCHAR(32) NOT NULL,
        created_at DATETIME(6) NOT NULL,
        updated_at DATETIME(6) NOT NULL
    ) DEFAULT CHARSET = utf8mb4
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id CHAR(36) NOT NULL PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        email VARCHAR(255) COLLATE utf8mb4_bin NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at DATETIME(6) NOT NULL,
        updated_at DATETIME(6) NOT NULL
    ) DEFAULT CHARSET = utf8mb4
    "#,
];

/// Create the `companies` and `users` tables if they do not exist yet.
pub async fn ensure_schema(pool: &MySqlPool) -> RepositoryResult<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct MySqlCompanyRepository {
    pool: Arc<MySqlPool>,
}

impl MySqlCompanyRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl CompanyRepository for MySqlCompanyRepository {
    #[instrument(skip(self, company), fields(company_id = %company.id), err)]
    async fn create(&self, company: &Company) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO companies
                (id, name, description, employee_count, registered, type, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(company.id.to_string())
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
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_company", e))?;

        row.map(|row| {
            let row = CompanyRow::from_row(&row).map_err(|e| map_sqlx_error("get_company", e))?;
            Company::try_from(row)
        })
        .transpose()
    }

    /// MySQL counts changed rows, not matched ones. Every accepted update moves
    /// `updated_at` forward, so zero affected rows still means a missing id.
    #[instrument(skip(self, company), fields(company_id = %company.id), err)]
    async fn update(&self, company: &Company) -> RepositoryResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE companies
            SET name = ?, description = ?, employee_count = ?, registered = ?, type = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&company.name)
        .bind(company.description.as_deref())
        .bind(company.employee_count)
        .bind(company.registered)
        .bind(company.company_type.as_str())
        .bind(company.updated_at)
        .bind(company.id.to_string())
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
        let result = sqlx::query("DELETE FROM companies WHERE id = ?")
            .bind(id.to_string())
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
        sqlx::query("SELECT COUNT(*) FROM companies WHERE name = ?")
            .bind(name)
            .fetch_one(&*self.pool)
            .await
            .and_then(|row| row.try_get::<i64, _>(0))
            .map(|count| count > 0)
            .map_err(|e| map_sqlx_error("company_exists_by_name", e))
    }
}

#[derive(Debug, Clone)]
pub struct MySqlUserRepository {
    pool: Arc<MySqlPool>,
}

impl MySqlUserRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl UserRepository for MySqlUserRepository {
    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn create(&self, user: &User) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.id.to_string())
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
            WHERE email = ?
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
        sqlx::query("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&*self.pool)
            .await
            .and_then(|row| row.try_get::<i64, _>(0))
            .map(|count| count > 0)
            .map_err(|e| map_sqlx_error("user_exists_by_email", e))
    }
}

impl<'r> FromRow<'r, MySqlRow> for CompanyRow {
    fn from_row(row: &'r MySqlRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        Ok(CompanyRow {
            id: uuid_from_text(&id, "id")?,
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

impl<'r> FromRow<'r, MySqlRow> for UserRow {
    fn from_row(row: &'r MySqlRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        Ok(UserRow {
            id: uuid_from_text(&id, "id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
