//! Company events and the publication seam that carries them out of the process.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventPublisher, PublishError, Published, Subscription};
pub use envelope::EventEnvelope;
pub use event::{COMPANY_CREATED, COMPANY_DELETED, COMPANY_UPDATED, CompanyEvent};
pub use in_memory_bus::InMemoryEventBus;
