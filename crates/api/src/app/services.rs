//! Service wiring: storage backend, event transport, credentials.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use firmhub_auth::{Argon2PasswordHasher, JwtIssuer, PasswordHasher};
use firmhub_events::{EventPublisher, InMemoryEventBus};
use firmhub_infra::config::EventBusConfig;
use firmhub_infra::event_bus::RedisPubSubPublisher;
use firmhub_infra::{
    AccountService, AppConfig, CompanyRepository, CompanyService, EventBusKind, Repositories,
    UserRepository,
};

pub type Companies = CompanyService<Arc<dyn CompanyRepository>, Arc<dyn EventPublisher>>;
pub type Accounts = AccountService<Arc<dyn UserRepository>>;

/// Everything the handlers need, shared across requests.
pub struct AppServices {
    pub companies: Companies,
    pub accounts: Accounts,
}

impl AppServices {
    pub fn new(
        repositories: Repositories,
        publisher: Arc<dyn EventPublisher>,
        hasher: Arc<dyn PasswordHasher>,
        issuer: Arc<dyn JwtIssuer>,
    ) -> Self {
        Self {
            companies: CompanyService::new(repositories.companies, publisher),
            accounts: AccountService::new(repositories.users, hasher, issuer),
        }
    }
}

/// Connect the configured backends.
pub async fn build_services(
    config: &AppConfig,
    issuer: Arc<dyn JwtIssuer>,
) -> anyhow::Result<AppServices> {
    let repositories = firmhub_infra::connect(&config.database)
        .await
        .context("failed to open storage")?;
    let publisher = build_publisher(&config.event_bus).await?;

    Ok(AppServices::new(
        repositories,
        publisher,
        Arc::new(Argon2PasswordHasher::new()),
        issuer,
    ))
}

async fn build_publisher(config: &EventBusConfig) -> anyhow::Result<Arc<dyn EventPublisher>> {
    match config.kind {
        EventBusKind::Redis => {
            let publisher = RedisPubSubPublisher::connect(&config.url)
                .await
                .context("failed to connect to redis")?;
            info!("publishing company events to redis");
            Ok(Arc::new(publisher))
        }
        EventBusKind::Memory => {
            info!("publishing company events to the in-memory bus");
            Ok(Arc::new(InMemoryEventBus::new()))
        }
    }
}
