use std::sync::Arc;

use bizdock_core::{AppResult, ResourceId, UserIdentity};
use bizdock_domain::{
    AccessRuleRegistry, FilterCondition, FilterGroup, Operation, PageRequest, Principal,
    QueryPlan, ResourceRecord, ResourceType, SortKey,
};
use tracing::{debug, info};

use crate::round_trip::bounded;
use crate::{
    AccessEngineConfig, ActorHierarchyRepository, PredicateBuilder, PrincipalRepository,
    PrincipalResolver, QueryAugmenter, RelationshipResolver, ResourceStore,
};

/// Evaluates row-level access for listings and single-resource checks.
///
/// Single checks run the listing query restricted to one identifier, so a
/// record is listed exactly when it can be accessed.
#[derive(Clone)]
pub struct AccessDecisionService {
    registry: Arc<AccessRuleRegistry>,
    principals: PrincipalResolver,
    predicates: PredicateBuilder,
    augmenter: QueryAugmenter,
    store: Arc<dyn ResourceStore>,
    config: AccessEngineConfig,
}

impl AccessDecisionService {
    /// Creates the decision service from its collaborators.
    #[must_use]
    pub fn new(
        registry: Arc<AccessRuleRegistry>,
        principal_repository: Arc<dyn PrincipalRepository>,
        hierarchy_repository: Arc<dyn ActorHierarchyRepository>,
        store: Arc<dyn ResourceStore>,
        config: AccessEngineConfig,
    ) -> Self {
        Self {
            registry,
            principals: PrincipalResolver::new(principal_repository, config),
            predicates: PredicateBuilder::new(RelationshipResolver::new(
                hierarchy_repository,
                config,
            )),
            augmenter: QueryAugmenter,
            store,
            config,
        }
    }

    /// Resolves the principal behind a session identity.
    pub async fn principal(&self, identity: &UserIdentity) -> AppResult<Principal> {
        self.principals.resolve(identity).await
    }

    /// Builds the listing query of a resource type for its listing operation.
    pub async fn list_accessible(
        &self,
        identity: &UserIdentity,
        resource_type: ResourceType,
        filter: Option<&FilterGroup>,
        order: &[SortKey],
    ) -> AppResult<QueryPlan> {
        self.list_accessible_for(
            identity,
            resource_type,
            resource_type.listing_operation(),
            filter,
            order,
        )
        .await
    }

    /// Builds the query selecting records the identity may access with the
    /// operation.
    pub async fn list_accessible_for(
        &self,
        identity: &UserIdentity,
        resource_type: ResourceType,
        operation: Operation,
        filter: Option<&FilterGroup>,
        order: &[SortKey],
    ) -> AppResult<QueryPlan> {
        let rule_set = self.registry.rule_set(resource_type, operation)?;
        let principal = self.principals.resolve(identity).await?;
        let access = self.predicates.build(&principal, rule_set).await?;

        Ok(self.augmenter.augment(rule_set, access, filter, order))
    }

    /// Returns whether the identity may perform the operation on the record.
    ///
    /// Denial is `Ok(false)`. Errors mean the decision could not be made.
    pub async fn can_access(
        &self,
        identity: &UserIdentity,
        resource_type: ResourceType,
        resource_id: ResourceId,
        operation: Operation,
    ) -> AppResult<bool> {
        let restriction = FilterGroup::condition(FilterCondition::identifier(resource_id));
        let plan = self
            .list_accessible_for(identity, resource_type, operation, Some(&restriction), &[])
            .await?;

        let allowed = if plan.is_deny_all() {
            false
        } else {
            bounded(
                self.config.round_trip_timeout,
                "resource count",
                self.store.count_resources(&plan),
            )
            .await?
                > 0
        };

        info!(
            subject = identity.subject(),
            resource_type = resource_type.as_str(),
            resource_id = resource_id.value(),
            operation = operation.as_str(),
            allowed,
            "access decision"
        );

        Ok(allowed)
    }

    /// Runs the listing query of a resource type against the store.
    pub async fn fetch_accessible(
        &self,
        identity: &UserIdentity,
        resource_type: ResourceType,
        filter: Option<&FilterGroup>,
        order: &[SortKey],
        page: PageRequest,
    ) -> AppResult<Vec<ResourceRecord>> {
        let plan = self
            .list_accessible(identity, resource_type, filter, order)
            .await?;
        if plan.is_deny_all() {
            debug!(
                subject = identity.subject(),
                resource_type = resource_type.as_str(),
                "listing denied for every record"
            );
            return Ok(Vec::new());
        }

        let records = bounded(
            self.config.round_trip_timeout,
            "resource listing",
            self.store.list_resources(&plan, page),
        )
        .await?;

        debug!(
            subject = identity.subject(),
            resource_type = resource_type.as_str(),
            record_count = records.len(),
            "listed accessible records"
        );

        Ok(records)
    }
}
