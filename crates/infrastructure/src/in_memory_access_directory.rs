use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use bizdock_application::{ActorHierarchyRepository, PrincipalRepository, ResourceStore};
use bizdock_core::{ActorId, AppError, AppResult, ResourceId};
use bizdock_domain::{PageRequest, Principal, QueryPlan, ResourceRecord, ResourceType};
use tokio::sync::RwLock;

/// In-memory principals, actor hierarchy and resource records.
///
/// Evaluates query plans in-process with the same semantics the PostgreSQL
/// store compiles to SQL.
#[derive(Debug, Default)]
pub struct InMemoryAccessDirectory {
    principals: RwLock<HashMap<String, Principal>>,
    actor_managers: RwLock<BTreeMap<ActorId, Option<ActorId>>>,
    resources: RwLock<BTreeMap<(ResourceType, ResourceId), ResourceRecord>>,
}

impl InMemoryAccessDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores or replaces a principal.
    pub async fn insert_principal(&self, principal: Principal) {
        self.principals
            .write()
            .await
            .insert(principal.subject().to_owned(), principal);
    }

    /// Stores or replaces an actor with its manager.
    pub async fn insert_actor(&self, actor_id: ActorId, manager_id: Option<ActorId>) {
        self.actor_managers
            .write()
            .await
            .insert(actor_id, manager_id);
    }

    /// Stores or replaces a resource record.
    pub async fn insert_resource(&self, record: ResourceRecord) {
        self.resources
            .write()
            .await
            .insert((record.resource_type(), record.id()), record);
    }

    /// Soft-deletes a resource record.
    pub async fn mark_deleted(
        &self,
        resource_type: ResourceType,
        resource_id: ResourceId,
    ) -> AppResult<()> {
        let mut resources = self.resources.write().await;
        let key = (resource_type, resource_id);
        let record = resources.remove(&key).ok_or_else(|| {
            AppError::NotFound(format!("resource {resource_type}/{resource_id} does not exist"))
        })?;
        resources.insert(key, record.into_deleted());

        Ok(())
    }

    async fn matching_records(&self, plan: &QueryPlan) -> Vec<ResourceRecord> {
        let resource_type = plan.resource_type();
        let first = (resource_type, ResourceId::new(i64::MIN));
        let last = (resource_type, ResourceId::new(i64::MAX));

        self.resources
            .read()
            .await
            .range(first..=last)
            .map(|(_, record)| record)
            .filter(|record| plan.matches(record))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl PrincipalRepository for InMemoryAccessDirectory {
    async fn find_principal(&self, subject: &str) -> AppResult<Option<Principal>> {
        Ok(self.principals.read().await.get(subject).cloned())
    }
}

#[async_trait]
impl ActorHierarchyRepository for InMemoryAccessDirectory {
    async fn list_direct_reports(&self, managers: &[ActorId]) -> AppResult<Vec<ActorId>> {
        Ok(self
            .actor_managers
            .read()
            .await
            .iter()
            .filter_map(|(actor_id, manager_id)| {
                manager_id
                    .is_some_and(|manager_id| managers.contains(&manager_id))
                    .then_some(*actor_id)
            })
            .collect())
    }
}

#[async_trait]
impl ResourceStore for InMemoryAccessDirectory {
    async fn count_resources(&self, plan: &QueryPlan) -> AppResult<u64> {
        let count = self.matching_records(plan).await.len();

        u64::try_from(count)
            .map_err(|error| AppError::Internal(format!("record count overflow: {error}")))
    }

    async fn list_resources(
        &self,
        plan: &QueryPlan,
        page: PageRequest,
    ) -> AppResult<Vec<ResourceRecord>> {
        let mut records = self.matching_records(plan).await;
        records.sort_by(|left, right| plan.compare(left, right));

        let offset = usize::try_from(page.offset())
            .map_err(|error| AppError::Validation(format!("invalid page offset: {error}")))?;
        let limit = usize::try_from(page.limit())
            .map_err(|error| AppError::Validation(format!("invalid page limit: {error}")))?;

        Ok(records.into_iter().skip(offset).take(limit).collect())
    }
}
