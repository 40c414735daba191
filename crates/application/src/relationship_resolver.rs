use std::collections::BTreeSet;
use std::sync::Arc;

use bizdock_core::{ActorId, AppError, AppResult};
use tracing::{debug, warn};

use crate::round_trip::bounded;
use crate::{AccessEngineConfig, ActorHierarchyRepository};

/// Resolves organizational relationships between actors.
#[derive(Clone)]
pub struct RelationshipResolver {
    hierarchy: Arc<dyn ActorHierarchyRepository>,
    config: AccessEngineConfig,
}

impl RelationshipResolver {
    /// Creates a resolver over the actor hierarchy.
    #[must_use]
    pub fn new(hierarchy: Arc<dyn ActorHierarchyRepository>, config: AccessEngineConfig) -> Self {
        Self { hierarchy, config }
    }

    /// Returns every actor below `actor_id` in the reporting hierarchy,
    /// excluding the actor itself.
    ///
    /// Walks one level per round-trip with no depth limit. Reaching an actor
    /// twice means the hierarchy is cyclic, which is reported as a
    /// relationship resolution error.
    pub async fn subordinates_of(&self, actor_id: ActorId) -> AppResult<BTreeSet<ActorId>> {
        let mut visited = BTreeSet::from([actor_id]);
        let mut subordinates = BTreeSet::new();
        let mut frontier = vec![actor_id];
        let mut depth = 0_usize;

        while !frontier.is_empty() {
            let reports = bounded(
                self.config.round_trip_timeout,
                "direct reports lookup",
                self.hierarchy.list_direct_reports(&frontier),
            )
            .await?;
            depth += 1;

            let mut next_frontier = Vec::with_capacity(reports.len());
            for report in reports {
                if !visited.insert(report) {
                    warn!(
                        actor_id = actor_id.value(),
                        revisited = report.value(),
                        depth,
                        "cyclic manager hierarchy"
                    );
                    return Err(AppError::RelationshipResolution(format!(
                        "cyclic manager hierarchy below actor {actor_id}: actor {report} reached twice"
                    )));
                }

                subordinates.insert(report);
                next_frontier.push(report);
            }

            frontier = next_frontier;
        }

        debug!(
            actor_id = actor_id.value(),
            subordinate_count = subordinates.len(),
            depth,
            "resolved subordinate closure"
        );

        Ok(subordinates)
    }

    /// Returns whether `candidate` is `manager` or reports to it, directly or
    /// transitively.
    pub async fn is_in_chain(&self, manager: ActorId, candidate: ActorId) -> AppResult<bool> {
        if manager == candidate {
            return Ok(true);
        }

        Ok(self.subordinates_of(manager).await?.contains(&candidate))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use bizdock_core::{ActorId, AppError};

    use super::RelationshipResolver;
    use crate::AccessEngineConfig;
    use crate::test_fakes::FakeHierarchy;

    fn resolver(hierarchy: Arc<FakeHierarchy>) -> RelationshipResolver {
        RelationshipResolver::new(hierarchy, AccessEngineConfig::default())
    }

    #[tokio::test]
    async fn subordinates_cover_the_whole_chain() {
        let hierarchy = Arc::new(FakeHierarchy::from_edges(&[(1, 2), (2, 3), (1, 4), (3, 5)]));
        let resolver = resolver(hierarchy.clone());

        let subordinates = resolver.subordinates_of(ActorId::new(1)).await;
        let expected: BTreeSet<ActorId> = [2, 3, 4, 5].into_iter().map(ActorId::new).collect();
        assert!(matches!(subordinates, Ok(value) if value == expected));
        // One round-trip per level: {1}, {2, 4}, {3}, {5}.
        assert_eq!(hierarchy.call_count().await, 4);
    }

    #[tokio::test]
    async fn leaf_actor_has_no_subordinates() {
        let resolver = resolver(Arc::new(FakeHierarchy::from_edges(&[(1, 2)])));

        let subordinates = resolver.subordinates_of(ActorId::new(2)).await;
        assert!(matches!(subordinates, Ok(value) if value.is_empty()));
    }

    #[tokio::test]
    async fn two_actor_cycle_is_a_resolution_error() {
        let resolver = resolver(Arc::new(FakeHierarchy::from_edges(&[(1, 2), (2, 1)])));

        let subordinates = resolver.subordinates_of(ActorId::new(1)).await;
        assert!(matches!(subordinates, Err(AppError::RelationshipResolution(_))));
    }

    #[tokio::test]
    async fn self_managed_actor_is_a_resolution_error() {
        let resolver = resolver(Arc::new(FakeHierarchy::from_edges(&[(1, 1)])));

        let in_chain = resolver.is_in_chain(ActorId::new(1), ActorId::new(9)).await;
        assert!(matches!(in_chain, Err(AppError::RelationshipResolution(_))));
    }

    #[tokio::test]
    async fn is_in_chain_follows_transitive_reports() {
        let resolver = resolver(Arc::new(FakeHierarchy::from_edges(&[(1, 2), (2, 3)])));

        assert!(matches!(
            resolver.is_in_chain(ActorId::new(1), ActorId::new(3)).await,
            Ok(true)
        ));
        assert!(matches!(
            resolver.is_in_chain(ActorId::new(3), ActorId::new(1)).await,
            Ok(false)
        ));
        assert!(matches!(
            resolver.is_in_chain(ActorId::new(7), ActorId::new(7)).await,
            Ok(true)
        ));
    }

    #[tokio::test]
    async fn storage_failure_is_a_resolution_error() {
        let hierarchy = FakeHierarchy {
            fail: true,
            ..FakeHierarchy::default()
        };
        let resolver = resolver(Arc::new(hierarchy));

        let subordinates = resolver.subordinates_of(ActorId::new(1)).await;
        assert!(matches!(subordinates, Err(AppError::RelationshipResolution(_))));
    }
}
