//! SQLite-backed repositories.
//!
//! Identifiers are stored as hyphenated UUID text and timestamps as RFC 3339
//! text. `UNIQUE` constraints back name/email uniqueness exactly as on Postgres.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};
use tracing::instrument;
use uuid::Uuid;

use firmhub_core::{Company, CompanyId, User};

use super::rows::{CompanyRow, UserRow, uuid_from_text};
use super::{
    CompanyRepository, RepositoryError, RepositoryResult, UserRepository, map_sqlx_error,
};

const SCHEMA: [&str; 2] = [
    r#"
    CREATE TABLE IF NOT EXISTS companies (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        description TEXT,
        employee_count INTEGER NOT NULL,
        registered BOOLEAN NOT NULL,
        type TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
];

/// Create the `companies` and `users` tables if they do not exist yet.
pub async fn ensure_schema(pool: &SqlitePool) -> RepositoryResult<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct SqliteCompanyRepository {
    pool: Arc<SqlitePool>,
}

impl SqliteCompanyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl CompanyRepository for SqliteCompanyRepository {
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
        sqlx::query("SELECT EXISTS(SELECT 1 FROM companies WHERE name = ?)")
            .bind(name)
            .fetch_one(&*self.pool)
            .await
            .and_then(|row| row.try_get::<bool, _>(0))
            .map_err(|e| map_sqlx_error("company_exists_by_name", e))
    }
}

#[derive(Debug, Clone)]
pub struct SqliteUserRepository {
    pool: Arc<SqlitePool>,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
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
        sqlx::query("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)")
            .bind(email)
            .fetch_one(&*self.pool)
            .await
            .and_then(|row| row.try_get::<bool, _>(0))
            .map_err(|e| map_sqlx_error("user_exists_by_email", e))
    }
}

fn uuid_column(row: &SqliteRow, column: &str) -> Result<Uuid, sqlx::Error> {
    let text: String = row.try_get(column)?;
    uuid_from_text(&text, column)
}

impl<'r> FromRow<'r, SqliteRow> for CompanyRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(CompanyRow {
            id: uuid_column(row, "id")?,
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

impl<'r> FromRow<'r, SqliteRow> for UserRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: uuid_column(row, "id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use firmhub_core::{CompanyType, NewCompany, timestamp_now};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn pool() -> SqlitePool {
        // A single connection keeps every query on the same in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        ensure_schema(&pool).await.unwrap();
        pool
    }

    fn company(name: &str) -> Company {
        Company::create(
            NewCompany {
                name: name.to_string(),
                description: Some("makes things".to_string()),
                employee_count: 42,
                registered: true,
                company_type: CompanyType::SoleProprietor,
            },
            timestamp_now(),
        )
    }

    #[tokio::test]
    async fn company_round_trips_through_storage() {
        let repo = SqliteCompanyRepository::new(pool().await);
        let c = company("Acme");
        repo.create(&c).await.unwrap();

        let loaded = repo.get_by_id(c.id).await.unwrap();
        assert_eq!(loaded, Some(c));
    }

    #[tokio::test]
    async fn unique_name_constraint_maps_to_conflict() {
        let repo = SqliteCompanyRepository::new(pool().await);
        repo.create(&company("Acme")).await.unwrap();

        let err = repo.create(&company("Acme")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)), "{err:?}");
    }

    #[tokio::test]
    async fn update_persists_changes_and_reports_missing_rows() {
        let repo = SqliteCompanyRepository::new(pool().await);
        let mut c = company("Acme");
        repo.create(&c).await.unwrap();

        c.name = "Acme Two".to_string();
        c.description = None;
        c.updated_at = c.updated_at + Duration::seconds(1);
        repo.update(&c).await.unwrap();
        assert_eq!(repo.get_by_id(c.id).await.unwrap(), Some(c.clone()));

        let ghost = company("Ghost");
        assert!(matches!(repo.update(&ghost).await, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn delete_then_get_is_none() {
        let repo = SqliteCompanyRepository::new(pool().await);
        let c = company("Acme");
        repo.create(&c).await.unwrap();
        assert!(repo.exists_by_name("Acme").await.unwrap());

        repo.delete(c.id).await.unwrap();
        assert_eq!(repo.get_by_id(c.id).await.unwrap(), None);
        assert!(!repo.exists_by_name("Acme").await.unwrap());
        assert!(matches!(repo.delete(c.id).await, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn users_round_trip_with_unique_email() {
        let repo = SqliteUserRepository::new(pool().await);
        let user = User::register("Jane Doe", "jane@example.com", "$argon2id$hash", Utc::now());
        repo.create(&user).await.unwrap();

        assert!(repo.exists_by_email("jane@example.com").await.unwrap());
        assert_eq!(repo.get_by_email("jane@example.com").await.unwrap(), Some(user));

        let dup = User::register("Jane Two", "jane@example.com", "$argon2id$hash", Utc::now());
        assert!(matches!(
            repo.create(&dup).await,
            Err(RepositoryError::Conflict(_))
        ));
    }
}
