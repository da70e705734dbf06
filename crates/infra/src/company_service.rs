//! Company mutation pipeline.
//!
//! Every mutating request runs the same steps, in order, on its own task:
//!
//! ```text
//! authorize → validate → existence check (update/delete)
//!           → uniqueness check (create, rename) → persist → publish → respond
//! ```
//!
//! - Steps before **persist** are pure checks; a rejection there leaves storage
//!   and the event bus untouched.
//! - **Persist** is a single repository call. The uniqueness pre-check is only an
//!   early exit: a duplicate that races past it is caught by the storage
//!   constraint and surfaces as the same conflict.
//! - **Publish** runs after the write is committed. Its failure is logged at
//!   `warn` and never changes the response.

use chrono::Utc;
use tracing::{error, info, instrument, warn};

use firmhub_core::validation::{validate_company_create, validate_company_update};
use firmhub_core::{Company, CompanyId, CreateCompany, UpdateCompany, UserId, timestamp_now};
use firmhub_events::{CompanyEvent, EventPublisher};

use crate::error::{ServiceError, ServiceResult, msg};
use crate::repository::{CompanyRepository, RepositoryError};

/// Orchestrates company reads and mutations over a repository and a publisher.
///
/// Holds no entity state between calls; both collaborators are shared and
/// must be safe for concurrent use.
#[derive(Debug, Clone)]
pub struct CompanyService<R, P> {
    companies: R,
    publisher: P,
}

impl<R, P> CompanyService<R, P>
where
    R: CompanyRepository,
    P: EventPublisher,
{
    pub fn new(companies: R, publisher: P) -> Self {
        Self {
            companies,
            publisher,
        }
    }

    /// Create a company. Responds with the stored snapshot.
    #[instrument(skip_all, fields(user_id = ?actor))]
    pub async fn create(
        &self,
        actor: Option<UserId>,
        payload: CreateCompany,
    ) -> ServiceResult<Company> {
        authorize(actor)?;

        let new = validate_company_create(payload).inspect_err(|e| {
            warn!(reason = %e, "company validation failed");
        })?;

        self.ensure_name_free(&new.name).await?;

        let company = Company::create(new, Utc::now());
        self.companies
            .create(&company)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(detail) => {
                    warn!(name = %company.name, %detail, "company name taken at insert");
                    ServiceError::company_name_taken()
                }
                other => {
                    error!(error = %other, "failed to create company");
                    ServiceError::dependency(msg::ERROR_CREATING_COMPANY)
                }
            })?;

        info!(company_id = %company.id, name = %company.name, "company created");
        self.publish(CompanyEvent::Created(company.clone())).await;
        Ok(company)
    }

    /// Public read; no identity required.
    #[instrument(skip_all, fields(company_id = %id))]
    pub async fn get(&self, id: CompanyId) -> ServiceResult<Company> {
        self.load(id).await
    }

    /// Apply a partial update. Only fields present in `payload` change.
    #[instrument(skip_all, fields(user_id = ?actor, company_id = %id))]
    pub async fn update(
        &self,
        actor: Option<UserId>,
        id: CompanyId,
        payload: UpdateCompany,
    ) -> ServiceResult<Company> {
        authorize(actor)?;

        let changes = validate_company_update(payload).inspect_err(|e| {
            warn!(reason = %e, "company update validation failed");
        })?;

        let mut company = self.load(id).await?;

        if let Some(name) = changes.rename_of(&company) {
            self.ensure_name_free(name).await?;
        }

        company.apply(changes, timestamp_now());

        self.companies
            .update(&company)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ServiceError::company_not_found(),
                RepositoryError::Conflict(detail) => {
                    warn!(name = %company.name, %detail, "company name taken at update");
                    ServiceError::company_name_taken()
                }
                other => {
                    error!(error = %other, "failed to update company");
                    ServiceError::dependency(msg::ERROR_UPDATING_COMPANY)
                }
            })?;

        info!(company_id = %company.id, "company updated");
        self.publish(CompanyEvent::Updated(company.clone())).await;
        Ok(company)
    }

    /// Hard-delete a company. Responds with the snapshot taken before deletion.
    #[instrument(skip_all, fields(user_id = ?actor, company_id = %id))]
    pub async fn delete(&self, actor: Option<UserId>, id: CompanyId) -> ServiceResult<Company> {
        authorize(actor)?;

        let company = self.load(id).await?;

        self.companies.delete(id).await.map_err(|e| match e {
            RepositoryError::NotFound => ServiceError::company_not_found(),
            other => {
                error!(error = %other, "failed to delete company");
                ServiceError::dependency(msg::ERROR_DELETING_COMPANY)
            }
        })?;

        info!(company_id = %id, "company deleted");
        self.publish(CompanyEvent::Deleted(id)).await;
        Ok(company)
    }

    /// Existence check. A failed lookup answers like a missing row.
    async fn load(&self, id: CompanyId) -> ServiceResult<Company> {
        match self.companies.get_by_id(id).await {
            Ok(Some(company)) => Ok(company),
            Ok(None) => Err(ServiceError::company_not_found()),
            Err(e) => {
                error!(company_id = %id, error = %e, "failed to load company");
                Err(ServiceError::company_not_found())
            }
        }
    }

    async fn ensure_name_free(&self, name: &str) -> ServiceResult<()> {
        match self.companies.exists_by_name(name).await {
            Ok(false) => Ok(()),
            Ok(true) => {
                warn!(name, "company name already exists");
                Err(ServiceError::company_name_taken())
            }
            Err(e) => {
                error!(name, error = %e, "failed to check name for uniqueness");
                Err(ServiceError::dependency(msg::ERROR_CHECKING_NAME))
            }
        }
    }

    /// Single best-effort attempt; never fails the caller.
    async fn publish(&self, event: CompanyEvent) {
        let event_type = event.event_type();
        let company_id = event.company_id();

        let envelope = match event.to_envelope(Utc::now()) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(event_type, %company_id, error = %e, "failed to encode company event");
                return;
            }
        };

        match self.publisher.publish(event.topic(), &envelope).await {
            Ok(()) => info!(event_type, %company_id, "company event published"),
            Err(e) => warn!(event_type, %company_id, error = %e, "failed to publish company event"),
        }
    }
}

fn authorize(actor: Option<UserId>) -> ServiceResult<UserId> {
    actor.ok_or_else(|| {
        warn!("unauthenticated company mutation attempt");
        ServiceError::unauthorized()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use firmhub_core::Field;
    use firmhub_events::{EventEnvelope, InMemoryEventBus, PublishError};

    use crate::repository::{InMemoryCompanyRepository, RepositoryResult};

    /// Counts every repository call, then delegates to an in-memory table.
    #[derive(Default)]
    struct CountingRepo {
        inner: InMemoryCompanyRepository,
        calls: AtomicUsize,
    }

    impl CountingRepo {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn hit(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl CompanyRepository for CountingRepo {
        async fn create(&self, company: &Company) -> RepositoryResult<()> {
            self.hit();
            self.inner.create(company).await
        }

        async fn get_by_id(&self, id: CompanyId) -> RepositoryResult<Option<Company>> {
            self.hit();
            self.inner.get_by_id(id).await
        }

        async fn update(&self, company: &Company) -> RepositoryResult<()> {
            self.hit();
            self.inner.update(company).await
        }

        async fn delete(&self, id: CompanyId) -> RepositoryResult<()> {
            self.hit();
            self.inner.delete(id).await
        }

        async fn exists_by_name(&self, name: &str) -> RepositoryResult<bool> {
            self.hit();
            self.inner.exists_by_name(name).await
        }
    }

    /// Repository whose uniqueness pre-check always misses, to model the race window.
    #[derive(Default)]
    struct BlindPrecheckRepo {
        inner: InMemoryCompanyRepository,
    }

    #[async_trait]
    impl CompanyRepository for BlindPrecheckRepo {
        async fn create(&self, company: &Company) -> RepositoryResult<()> {
            self.inner.create(company).await
        }

        async fn get_by_id(&self, id: CompanyId) -> RepositoryResult<Option<Company>> {
            self.inner.get_by_id(id).await
        }

        async fn update(&self, company: &Company) -> RepositoryResult<()> {
            self.inner.update(company).await
        }

        async fn delete(&self, id: CompanyId) -> RepositoryResult<()> {
            self.inner.delete(id).await
        }

        async fn exists_by_name(&self, _name: &str) -> RepositoryResult<bool> {
            Ok(false)
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Fault {
        Exists,
        Create,
        Load,
        UpdateStorage,
        UpdateMissing,
        Delete,
    }

    /// Delegates to an in-memory table except for the one call named by `fault`.
    struct FaultyRepo {
        inner: InMemoryCompanyRepository,
        fault: Fault,
    }

    impl FaultyRepo {
        fn new(fault: Fault) -> Self {
            Self {
                inner: InMemoryCompanyRepository::new(),
                fault,
            }
        }

        fn broken() -> RepositoryError {
            RepositoryError::Storage("connection reset".to_string())
        }
    }

    #[async_trait]
    impl CompanyRepository for FaultyRepo {
        async fn create(&self, company: &Company) -> RepositoryResult<()> {
            if self.fault == Fault::Create {
                return Err(Self::broken());
            }
            self.inner.create(company).await
        }

        async fn get_by_id(&self, id: CompanyId) -> RepositoryResult<Option<Company>> {
            if self.fault == Fault::Load {
                return Err(Self::broken());
            }
            self.inner.get_by_id(id).await
        }

        async fn update(&self, company: &Company) -> RepositoryResult<()> {
            match self.fault {
                Fault::UpdateStorage => Err(Self::broken()),
                Fault::UpdateMissing => Err(RepositoryError::NotFound),
                _ => self.inner.update(company).await,
            }
        }

        async fn delete(&self, id: CompanyId) -> RepositoryResult<()> {
            if self.fault == Fault::Delete {
                return Err(Self::broken());
            }
            self.inner.delete(id).await
        }

        async fn exists_by_name(&self, name: &str) -> RepositoryResult<bool> {
            if self.fault == Fault::Exists {
                return Err(Self::broken());
            }
            self.inner.exists_by_name(name).await
        }
    }

    #[derive(Default)]
    struct CountingPublisher {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingPublisher {
        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EventPublisher for CountingPublisher {
        async fn publish(&self, _topic: &str, _event: &EventEnvelope) -> Result<(), PublishError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(PublishError::Transport("broker down".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn create_payload(name: &str) -> CreateCompany {
        CreateCompany {
            name: Field::Value(name.to_string()),
            description: Field::Value("widgets".to_string()),
            employee_count: Field::Value(42),
            registered: Field::Value(true),
            company_type: Field::Value("Corporations".to_string()),
        }
    }

    fn actor() -> Option<UserId> {
        Some(UserId::new())
    }

    #[tokio::test]
    async fn create_then_get_returns_identical_snapshot() {
        let svc = CompanyService::new(InMemoryCompanyRepository::new(), InMemoryEventBus::new());

        let created = svc.create(actor(), create_payload("Acme")).await.unwrap();
        assert_eq!(created.created_at, created.updated_at);

        let fetched = svc.get(created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn unauthenticated_mutations_touch_nothing() {
        let repo = Arc::new(CountingRepo::default());
        let publisher = Arc::new(CountingPublisher::default());
        let svc = CompanyService::new(repo.clone(), publisher.clone());

        let err = svc.create(None, create_payload("Acme")).await.unwrap_err();
        assert_eq!(err, ServiceError::Unauthorized("Unauthorized".to_string()));

        let id = CompanyId::new();
        assert!(matches!(
            svc.update(None, id, UpdateCompany::default()).await,
            Err(ServiceError::Unauthorized(_))
        ));
        assert!(matches!(
            svc.delete(None, id).await,
            Err(ServiceError::Unauthorized(_))
        ));

        assert_eq!(repo.calls(), 0);
        assert_eq!(publisher.calls(), 0);
    }

    #[tokio::test]
    async fn invalid_payload_is_rejected_before_storage() {
        let repo = Arc::new(CountingRepo::default());
        let publisher = Arc::new(CountingPublisher::default());
        let svc = CompanyService::new(repo.clone(), publisher.clone());

        let err = svc
            .create(actor(), create_payload("Acme123456789012"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ServiceError::Validation("name must be 15 characters or less".to_string())
        );
        assert_eq!(repo.calls(), 0);
        assert_eq!(publisher.calls(), 0);
    }

    #[tokio::test]
    async fn duplicate_name_conflicts_without_new_row_or_event() {
        let repo = Arc::new(CountingRepo::default());
        let publisher = Arc::new(CountingPublisher::default());
        let svc = CompanyService::new(repo.clone(), publisher.clone());

        svc.create(actor(), create_payload("Acme")).await.unwrap();
        let err = svc.create(actor(), create_payload("Acme")).await.unwrap_err();

        assert_eq!(
            err,
            ServiceError::Conflict("Company name already exists".to_string())
        );
        assert_eq!(repo.inner.len(), 1);
        assert_eq!(publisher.calls(), 1);
    }

    #[tokio::test]
    async fn storage_constraint_catches_duplicates_the_precheck_missed() {
        let repo = Arc::new(BlindPrecheckRepo::default());
        let publisher = Arc::new(CountingPublisher::default());
        let svc = CompanyService::new(repo.clone(), publisher.clone());

        svc.create(actor(), create_payload("Acme")).await.unwrap();
        let err = svc.create(actor(), create_payload("Acme")).await.unwrap_err();

        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(repo.inner.len(), 1);
        assert_eq!(publisher.calls(), 1);
    }

    #[tokio::test]
    async fn concurrent_creates_with_same_name_commit_once() {
        let svc = Arc::new(CompanyService::new(
            Arc::new(BlindPrecheckRepo::default()),
            InMemoryEventBus::new(),
        ));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let svc = svc.clone();
            handles.push(tokio::spawn(async move {
                svc.create(Some(UserId::new()), create_payload("Acme")).await
            }));
        }

        let mut committed = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => committed += 1,
                Err(e) => assert!(matches!(e, ServiceError::Conflict(_))),
            }
        }
        assert_eq!(committed, 1);
    }

    #[tokio::test]
    async fn publish_failure_does_not_fail_or_roll_back() {
        let repo = Arc::new(InMemoryCompanyRepository::new());
        let publisher = Arc::new(CountingPublisher::failing());
        let svc = CompanyService::new(repo.clone(), publisher.clone());

        let created = svc.create(actor(), create_payload("Acme")).await.unwrap();
        assert_eq!(repo.get_by_id(created.id).await.unwrap(), Some(created.clone()));

        let deleted = svc.delete(actor(), created.id).await.unwrap();
        assert_eq!(deleted, created);
        assert_eq!(publisher.calls(), 2);
    }

    #[tokio::test]
    async fn partial_update_touches_only_present_fields() {
        let svc = CompanyService::new(InMemoryCompanyRepository::new(), InMemoryEventBus::new());
        let created = svc.create(actor(), create_payload("Acme")).await.unwrap();

        let patch = UpdateCompany {
            name: Field::Value("Acme Two".to_string()),
            employee_count: Field::Value(7),
            ..Default::default()
        };
        let updated = svc.update(actor(), created.id, patch).await.unwrap();

        assert_eq!(updated.name, "Acme Two");
        assert_eq!(updated.employee_count, 7);
        assert_eq!(updated.description, created.description);
        assert_eq!(updated.registered, created.registered);
        assert_eq!(updated.company_type, created.company_type);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > created.updated_at);

        assert_eq!(svc.get(created.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn back_to_back_updates_strictly_increase_updated_at() {
        let svc = CompanyService::new(InMemoryCompanyRepository::new(), InMemoryEventBus::new());
        let created = svc.create(actor(), create_payload("Acme")).await.unwrap();

        let mut last = created.updated_at;
        for count in 1..=5 {
            let patch = UpdateCompany {
                employee_count: Field::Value(count),
                ..Default::default()
            };
            let updated = svc.update(actor(), created.id, patch).await.unwrap();
            assert!(updated.updated_at > last);
            last = updated.updated_at;
        }
    }

    #[tokio::test]
    async fn update_rejects_invalid_employee_count_without_name() {
        let repo = Arc::new(CountingRepo::default());
        let svc = CompanyService::new(repo.clone(), InMemoryEventBus::new());

        let patch = UpdateCompany {
            employee_count: Field::Value(0),
            ..Default::default()
        };
        let err = svc.update(actor(), CompanyId::new(), patch).await.unwrap_err();
        assert_eq!(
            err,
            ServiceError::Validation("employee count must be positive".to_string())
        );
        assert_eq!(repo.calls(), 0);
    }

    #[tokio::test]
    async fn rename_to_taken_name_conflicts_but_same_name_is_fine() {
        let svc = CompanyService::new(InMemoryCompanyRepository::new(), InMemoryEventBus::new());
        svc.create(actor(), create_payload("Acme")).await.unwrap();
        let other = svc.create(actor(), create_payload("Globex")).await.unwrap();

        let taken = UpdateCompany {
            name: Field::Value("Acme".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            svc.update(actor(), other.id, taken).await,
            Err(ServiceError::Conflict(_))
        ));

        let same = UpdateCompany {
            name: Field::Value("Globex".to_string()),
            ..Default::default()
        };
        assert!(svc.update(actor(), other.id, same).await.is_ok());
    }

    #[tokio::test]
    async fn missing_company_is_not_found_everywhere() {
        let publisher = Arc::new(CountingPublisher::default());
        let svc = CompanyService::new(InMemoryCompanyRepository::new(), publisher.clone());
        let id = CompanyId::new();

        let not_found = ServiceError::NotFound("Company not found".to_string());
        assert_eq!(svc.get(id).await.unwrap_err(), not_found);
        assert_eq!(
            svc.update(actor(), id, UpdateCompany::default()).await.unwrap_err(),
            not_found
        );
        assert_eq!(svc.delete(actor(), id).await.unwrap_err(), not_found);
        assert_eq!(publisher.calls(), 0);
    }

    #[tokio::test]
    async fn events_carry_snapshot_or_id() {
        let bus = Arc::new(InMemoryEventBus::new());
        let sub = bus.subscribe();
        let svc = CompanyService::new(InMemoryCompanyRepository::new(), bus.clone());

        let created = svc.create(actor(), create_payload("Acme")).await.unwrap();
        let patch = UpdateCompany {
            registered: Field::Value(false),
            ..Default::default()
        };
        let updated = svc.update(actor(), created.id, patch).await.unwrap();
        svc.delete(actor(), created.id).await.unwrap();

        let events = sub.drain();
        let topics: Vec<&str> = events.iter().map(|e| e.topic.as_str()).collect();
        assert_eq!(topics, ["company.created", "company.updated", "company.deleted"]);

        let snapshot: Company = serde_json::from_value(events[1].envelope.data().clone()).unwrap();
        assert_eq!(snapshot, updated);
        assert_eq!(
            events[2].envelope.data(),
            &serde_json::json!({ "id": created.id.to_string() })
        );
        assert_eq!(svc.get(created.id).await.unwrap_err(), ServiceError::company_not_found());
    }

    /// Seed one company directly in storage so the fault only hits the call under test.
    async fn seeded(fault: Fault) -> (Arc<FaultyRepo>, Company) {
        let repo = Arc::new(FaultyRepo::new(fault));
        let company = Company::create(
            validate_company_create(create_payload("Acme")).unwrap(),
            Utc::now(),
        );
        repo.inner.create(&company).await.unwrap();
        (repo, company)
    }

    #[tokio::test]
    async fn storage_failures_on_create_surface_as_dependency_errors() {
        let publisher = Arc::new(CountingPublisher::default());

        let svc = CompanyService::new(FaultyRepo::new(Fault::Create), publisher.clone());
        assert_eq!(
            svc.create(actor(), create_payload("Acme")).await.unwrap_err(),
            ServiceError::Dependency("Error creating company".to_string())
        );

        let svc = CompanyService::new(FaultyRepo::new(Fault::Exists), publisher.clone());
        assert_eq!(
            svc.create(actor(), create_payload("Acme")).await.unwrap_err(),
            ServiceError::Dependency("Error checking name for uniqueness".to_string())
        );

        assert_eq!(publisher.calls(), 0);
    }

    #[tokio::test]
    async fn update_storage_failure_is_a_dependency_error() {
        let (repo, company) = seeded(Fault::UpdateStorage).await;
        let publisher = Arc::new(CountingPublisher::default());
        let svc = CompanyService::new(repo.clone(), publisher.clone());

        let patch = UpdateCompany {
            employee_count: Field::Value(7),
            ..Default::default()
        };
        assert_eq!(
            svc.update(actor(), company.id, patch).await.unwrap_err(),
            ServiceError::Dependency("Error updating company".to_string())
        );
        assert_eq!(repo.inner.get_by_id(company.id).await.unwrap(), Some(company));
        assert_eq!(publisher.calls(), 0);
    }

    #[tokio::test]
    async fn row_vanishing_before_update_is_not_found() {
        let (repo, company) = seeded(Fault::UpdateMissing).await;
        let publisher = Arc::new(CountingPublisher::default());
        let svc = CompanyService::new(repo, publisher.clone());

        assert_eq!(
            svc.update(actor(), company.id, UpdateCompany::default()).await.unwrap_err(),
            ServiceError::NotFound("Company not found".to_string())
        );
        assert_eq!(publisher.calls(), 0);
    }

    #[tokio::test]
    async fn delete_storage_failure_keeps_the_row() {
        let (repo, company) = seeded(Fault::Delete).await;
        let publisher = Arc::new(CountingPublisher::default());
        let svc = CompanyService::new(repo.clone(), publisher.clone());

        assert_eq!(
            svc.delete(actor(), company.id).await.unwrap_err(),
            ServiceError::Dependency("Error deleting company".to_string())
        );
        assert_eq!(repo.inner.len(), 1);
        assert_eq!(publisher.calls(), 0);
    }

    #[tokio::test]
    async fn failed_lookup_reads_as_not_found() {
        let (repo, company) = seeded(Fault::Load).await;
        let publisher = Arc::new(CountingPublisher::default());
        let svc = CompanyService::new(repo, publisher.clone());

        let not_found = ServiceError::NotFound("Company not found".to_string());
        assert_eq!(svc.get(company.id).await.unwrap_err(), not_found);
        assert_eq!(svc.delete(actor(), company.id).await.unwrap_err(), not_found);
        assert_eq!(publisher.calls(), 0);
    }
}
