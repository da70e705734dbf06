//! Company entity, its payloads and its validated change sets.

use core::str::FromStr;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::field::Field;
use crate::id::CompanyId;

/// Maximum company name length, in characters.
pub const MAX_NAME_CHARS: usize = 15;

/// Maximum description length, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 3000;

/// Legal form of a company.
///
/// The wire names are part of the public contract and differ from the variant
/// names for two of the four values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompanyType {
    #[serde(rename = "Corporations")]
    Corporation,
    NonProfit,
    Cooperative,
    #[serde(rename = "Sole Proprietorship")]
    SoleProprietor,
}

impl CompanyType {
    pub const ALL: [CompanyType; 4] = [
        CompanyType::Corporation,
        CompanyType::NonProfit,
        CompanyType::Cooperative,
        CompanyType::SoleProprietor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CompanyType::Corporation => "Corporations",
            CompanyType::NonProfit => "NonProfit",
            CompanyType::Cooperative => "Cooperative",
            CompanyType::SoleProprietor => "Sole Proprietorship",
        }
    }
}

impl core::fmt::Display for CompanyType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompanyType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::validation(crate::validation::msg::INVALID_TYPE))
    }
}

/// A company record.
///
/// # Invariants
/// - `id` and `created_at` never change after creation.
/// - `updated_at` strictly increases on every applied change set.
/// - `name` is unique across the collection (enforced by storage).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub employee_count: i32,
    pub registered: bool,
    #[serde(rename = "type")]
    pub company_type: CompanyType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    /// Build a fresh record from a validated payload. Both timestamps are `now`.
    pub fn create(new: NewCompany, now: DateTime<Utc>) -> Self {
        let now = now.trunc_subsecs(6);
        Self {
            id: CompanyId::new(),
            name: new.name,
            description: new.description,
            employee_count: new.employee_count,
            registered: new.registered,
            company_type: new.company_type,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a validated change set. Absent fields are left untouched.
    pub fn apply(&mut self, changes: CompanyChanges, now: DateTime<Utc>) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        match changes.description {
            Field::Missing => {}
            Field::Null => self.description = None,
            Field::Value(description) => self.description = Some(description),
        }
        if let Some(count) = changes.employee_count {
            self.employee_count = count;
        }
        if let Some(registered) = changes.registered {
            self.registered = registered;
        }
        if let Some(company_type) = changes.company_type {
            self.company_type = company_type;
        }
        self.updated_at = next_update_timestamp(self.updated_at, now);
    }
}

/// Current UTC time at the precision every storage backend keeps.
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// The `updated_at` value to use after `previous`, given the clock reads `now`.
///
/// Always strictly greater than `previous`.
pub fn next_update_timestamp(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    let now = now.trunc_subsecs(6);
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

/// Raw create payload, exactly as the client sent it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCompany {
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub name: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub description: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub employee_count: Field<i32>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub registered: Field<bool>,
    #[serde(default, rename = "type", skip_serializing_if = "Field::is_missing")]
    pub company_type: Field<String>,
}

/// Raw partial-update payload. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCompany {
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub name: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub description: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub employee_count: Field<i32>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub registered: Field<bool>,
    #[serde(default, rename = "type", skip_serializing_if = "Field::is_missing")]
    pub company_type: Field<String>,
}

/// A create payload that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCompany {
    pub name: String,
    pub description: Option<String>,
    pub employee_count: i32,
    pub registered: bool,
    pub company_type: CompanyType,
}

/// An update payload that passed validation.
///
/// `description` keeps its tri-state: `Null` clears the stored description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyChanges {
    pub name: Option<String>,
    pub description: Field<String>,
    pub employee_count: Option<i32>,
    pub registered: Option<bool>,
    pub company_type: Option<CompanyType>,
}

impl CompanyChanges {
    /// The new name, if this change set renames `current`.
    pub fn rename_of<'a>(&'a self, current: &Company) -> Option<&'a str> {
        self.name.as_deref().filter(|name| *name != current.name)
    }
}
