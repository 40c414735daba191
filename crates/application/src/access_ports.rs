use async_trait::async_trait;
use bizdock_core::{ActorId, AppResult};
use bizdock_domain::{PageRequest, Principal, QueryPlan, ResourceRecord};

/// Repository port resolving authenticated subjects into principals.
#[async_trait]
pub trait PrincipalRepository: Send + Sync {
    /// Finds the active principal for an account subject, with its held
    /// permissions and linked actor.
    async fn find_principal(&self, subject: &str) -> AppResult<Option<Principal>>;
}

/// Repository port over the actor reporting hierarchy.
#[async_trait]
pub trait ActorHierarchyRepository: Send + Sync {
    /// Lists actors whose manager is one of the given actors.
    ///
    /// Implementations answer one hierarchy level per call.
    async fn list_direct_reports(&self, managers: &[ActorId]) -> AppResult<Vec<ActorId>>;
}

/// Storage port executing augmented query plans.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Counts records selected by the plan.
    async fn count_resources(&self, plan: &QueryPlan) -> AppResult<u64>;

    /// Lists one page of records selected by the plan, in plan order.
    async fn list_resources(
        &self,
        plan: &QueryPlan,
        page: PageRequest,
    ) -> AppResult<Vec<ResourceRecord>>;
}
