//! Storage row shapes shared by the SQL backends.
//!
//! Each backend provides its own `FromRow` impl; conversion into domain types
//! lives here once.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use firmhub_core::{Company, CompanyId, CompanyType, User, UserId};

use super::RepositoryError;

/// Decode a UUID kept as hyphenated text (SQLite, MySQL).
pub(crate) fn uuid_from_text(text: &str, column: &str) -> Result<Uuid, sqlx::Error> {
    Uuid::parse_str(text).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

pub(crate) struct CompanyRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub employee_count: i32,
    pub registered: bool,
    pub company_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<CompanyRow> for Company {
    type Error = RepositoryError;

    fn try_from(row: CompanyRow) -> Result<Self, Self::Error> {
        let company_type: CompanyType = row.company_type.parse().map_err(|_| {
            RepositoryError::Storage(format!(
                "unknown company type in storage: {:?}",
                row.company_type
            ))
        })?;
        Ok(Company {
            id: CompanyId::from_uuid(row.id),
            name: row.name,
            description: row.description,
            employee_count: row.employee_count,
            registered: row.registered,
            company_type,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub(crate) struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::from_uuid(row.id),
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
