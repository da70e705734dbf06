use chrono::{DateTime, Utc};
use serde_json::json;

use firmhub_core::{Company, CompanyId};

use crate::envelope::EventEnvelope;

pub const COMPANY_CREATED: &str = "company.created";
pub const COMPANY_UPDATED: &str = "company.updated";
pub const COMPANY_DELETED: &str = "company.deleted";

/// Notification describing a committed company mutation.
///
/// One topic per event type; the topic name equals the type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompanyEvent {
    Created(Company),
    Updated(Company),
    Deleted(CompanyId),
}

impl CompanyEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            CompanyEvent::Created(_) => COMPANY_CREATED,
            CompanyEvent::Updated(_) => COMPANY_UPDATED,
            CompanyEvent::Deleted(_) => COMPANY_DELETED,
        }
    }

    pub fn topic(&self) -> &'static str {
        self.event_type()
    }

    pub fn company_id(&self) -> CompanyId {
        match self {
            CompanyEvent::Created(c) | CompanyEvent::Updated(c) => c.id,
            CompanyEvent::Deleted(id) => *id,
        }
    }

    pub fn to_envelope(
        &self,
        timestamp: DateTime<Utc>,
    ) -> Result<EventEnvelope, serde_json::Error> {
        let data = match self {
            CompanyEvent::Created(c) | CompanyEvent::Updated(c) => serde_json::to_value(c)?,
            CompanyEvent::Deleted(id) => json!({ "id": id.to_string() }),
        };
        Ok(EventEnvelope::new(self.event_type(), timestamp, data))
    }
}
