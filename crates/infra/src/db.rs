//! Storage backend selection.
//!
//! The dialect is chosen once at startup; everything downstream only sees the
//! repository traits.

use std::str::FromStr;
use std::sync::Arc;

use sqlx::mysql::MySqlPoolOptions;
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

use crate::config::{DatabaseConfig, DatabaseDialect};
use crate::repository::{
    CompanyRepository, InMemoryCompanyRepository, InMemoryUserRepository, MySqlCompanyRepository,
    MySqlUserRepository, PostgresCompanyRepository, PostgresUserRepository, RepositoryError,
    RepositoryResult, SqliteCompanyRepository, SqliteUserRepository, UserRepository,
    map_sqlx_error, mysql, postgres, sqlite,
};

const MAX_CONNECTIONS: u32 = 10;

/// The repositories for one storage backend.
#[derive(Clone)]
pub struct Repositories {
    pub companies: Arc<dyn CompanyRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            companies: Arc::new(InMemoryCompanyRepository::new()),
            users: Arc::new(InMemoryUserRepository::new()),
        }
    }
}

/// Open the configured backend and make sure its schema exists.
pub async fn connect(config: &DatabaseConfig) -> RepositoryResult<Repositories> {
    let url = || {
        config
            .url
            .as_deref()
            .ok_or_else(|| RepositoryError::Storage("DATABASE_URL is not set".to_string()))
    };

    match config.dialect {
        DatabaseDialect::Memory => {
            info!("using in-memory storage");
            Ok(Repositories::in_memory())
        }
        DatabaseDialect::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(MAX_CONNECTIONS)
                .connect(url()?)
                .await
                .map_err(|e| map_sqlx_error("connect", e))?;
            postgres::ensure_schema(&pool).await?;
            info!("connected to postgres");
            Ok(Repositories {
                companies: Arc::new(PostgresCompanyRepository::new(pool.clone())),
                users: Arc::new(PostgresUserRepository::new(pool)),
            })
        }
        DatabaseDialect::MySql => {
            let pool = MySqlPoolOptions::new()
                .max_connections(MAX_CONNECTIONS)
                .connect(url()?)
                .await
                .map_err(|e| map_sqlx_error("connect", e))?;
            mysql::ensure_schema(&pool).await?;
            info!("connected to mysql");
            Ok(Repositories {
                companies: Arc::new(MySqlCompanyRepository::new(pool.clone())),
                users: Arc::new(MySqlUserRepository::new(pool)),
            })
        }
        DatabaseDialect::Sqlite => {
            let url = url()?;
            let options = SqliteConnectOptions::from_str(url)
                .map_err(|e| map_sqlx_error("connect", e))?
                .create_if_missing(true);
            // Each connection to an in-memory database is a separate database.
            let max = if url.contains(":memory:") { 1 } else { MAX_CONNECTIONS };
            let pool = SqlitePoolOptions::new()
                .max_connections(max)
                .connect_with(options)
                .await
                .map_err(|e| map_sqlx_error("connect", e))?;
            sqlite::ensure_schema(&pool).await?;
            info!("connected to sqlite");
            Ok(Repositories {
                companies: Arc::new(SqliteCompanyRepository::new(pool.clone())),
                users: Arc::new(SqliteUserRepository::new(pool)),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use firmhub_core::User;

    #[tokio::test]
    async fn sqlite_memory_backend_is_usable_end_to_end() {
        let repos = connect(&DatabaseConfig {
            dialect: DatabaseDialect::Sqlite,
            url: Some("sqlite::memory:".to_string()),
        })
        .await
        .unwrap();

        let user = User::register("Jane Doe", "jane@example.com", "hash", Utc::now());
        repos.users.create(&user).await.unwrap();
        assert!(repos.users.exists_by_email("jane@example.com").await.unwrap());
        assert!(!repos.companies.exists_by_name("Acme").await.unwrap());
    }

    #[tokio::test]
    async fn memory_backend_needs_no_url() {
        let repos = connect(&DatabaseConfig::memory()).await.unwrap();
        assert!(!repos.users.exists_by_email("x@example.com").await.unwrap());
    }
}
