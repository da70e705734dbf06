use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use firmhub_core::{Company, CompanyId, User, UserId};

use super::{CompanyRepository, RepositoryError, RepositoryResult, UserRepository};

fn read<T>(lock: &RwLock<T>) -> RepositoryResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| RepositoryError::Storage("in-memory store lock poisoned".to_string()))
}

fn write<T>(lock: &RwLock<T>) -> RepositoryResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| RepositoryError::Storage("in-memory store lock poisoned".to_string()))
}

/// In-memory company table.
///
/// Intended for tests/dev. Name uniqueness is checked under the write lock,
/// so it holds under concurrent creates just like a `UNIQUE` column.
#[derive(Debug, Default)]
pub struct InMemoryCompanyRepository {
    rows: RwLock<HashMap<CompanyId, Company>>,
}

impl InMemoryCompanyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CompanyRepository for InMemoryCompanyRepository {
    async fn create(&self, company: &Company) -> RepositoryResult<()> {
        let mut rows = write(&self.rows)?;
        if rows.contains_key(&company.id) {
            return Err(RepositoryError::Conflict(format!(
                "company id {} already exists",
                company.id
            )));
        }
        if rows.values().any(|c| c.name == company.name) {
            return Err(RepositoryError::Conflict(format!(
                "company name {:?} already exists",
                company.name
            )));
        }
        rows.insert(company.id, company.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: CompanyId) -> RepositoryResult<Option<Company>> {
        Ok(read(&self.rows)?.get(&id).cloned())
    }

    async fn update(&self, company: &Company) -> RepositoryResult<()> {
        let mut rows = write(&self.rows)?;
        if !rows.contains_key(&company.id) {
            return Err(RepositoryError::NotFound);
        }
        if rows
            .values()
            .any(|c| c.id != company.id && c.name == company.name)
        {
            return Err(RepositoryError::Conflict(format!(
                "company name {:?} already exists",
                company.name
            )));
        }
        rows.insert(company.id, company.clone());
        Ok(())
    }

    async fn delete(&self, id: CompanyId) -> RepositoryResult<()> {
        write(&self.rows)?
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    async fn exists_by_name(&self, name: &str) -> RepositoryResult<bool> {
        Ok(read(&self.rows)?.values().any(|c| c.name == name))
    }
}

/// In-memory user table with unique emails.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    rows: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &User) -> RepositoryResult<()> {
        let mut rows = write(&self.rows)?;
        if rows.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict(format!(
                "email {:?} already registered",
                user.email
            )));
        }
        rows.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        Ok(read(&self.rows)?.values().find(|u| u.email == email).cloned())
    }

    async fn exists_by_email(&self, email: &str) -> RepositoryResult<bool> {
        Ok(read(&self.rows)?.values().any(|u| u.email == email))
    }
}
