use bizdock_domain::{AccessPredicate, AccessRuleSet, FilterGroup, QueryPlan, SortKey};

/// Combines a caller query with an access predicate.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryAugmenter;

impl QueryAugmenter {
    /// Returns `(filter) AND (access) AND (guards) AND NOT deleted`, ordered
    /// by the caller's keys.
    ///
    /// The caller's filter and order are copied, never modified.
    #[must_use]
    pub fn augment(
        &self,
        rule_set: &AccessRuleSet,
        access: AccessPredicate,
        filter: Option<&FilterGroup>,
        order: &[SortKey],
    ) -> QueryPlan {
        QueryPlan::new(
            rule_set.resource_type(),
            rule_set.operation(),
            filter.cloned(),
            order.to_vec(),
            access,
            rule_set.guards().to_vec(),
        )
    }
}
