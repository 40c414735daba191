use std::collections::BTreeSet;

use bizdock_core::AppResult;
use bizdock_domain::{
    AccessClause, AccessPredicate, AccessRule, AccessRuleSet, Principal, RelationshipContext,
};
use tracing::debug;

use crate::RelationshipResolver;

/// Builds the access predicate of a principal for one rule set.
#[derive(Clone)]
pub struct PredicateBuilder {
    relationships: RelationshipResolver,
}

impl PredicateBuilder {
    /// Creates a builder resolving relationships through the resolver.
    #[must_use]
    pub fn new(relationships: RelationshipResolver) -> Self {
        Self { relationships }
    }

    /// Builds the OR of every clause the principal qualifies for.
    ///
    /// The result starts as deny-all. A held blanket permission adds the
    /// always-true clause and rule evaluation continues. Actor-anchored
    /// rules are skipped when the principal has no linked actor. The
    /// subordinate closure is resolved at most once, and only when a held
    /// rule needs it; its failures propagate unchanged.
    pub async fn build(
        &self,
        principal: &Principal,
        rule_set: &AccessRuleSet,
    ) -> AppResult<AccessPredicate> {
        let mut predicate = AccessPredicate::deny_all();

        if let Some(blanket) = rule_set.blanket()
            && principal.holds(blanket)
        {
            predicate.push(AccessClause::BlanketPermission);
        }

        let held_rules: Vec<&AccessRule> = rule_set
            .rules()
            .iter()
            .filter(|rule| {
                rule.permission()
                    .is_none_or(|permission| principal.holds(permission))
            })
            .collect();

        let subordinates = match principal.actor_id() {
            Some(actor_id)
                if held_rules
                    .iter()
                    .any(|rule| rule.relationship().requires_subordinates()) =>
            {
                self.relationships.subordinates_of(actor_id).await?
            }
            _ => BTreeSet::new(),
        };

        let context = RelationshipContext {
            subject: principal.subject(),
            actor_id: principal.actor_id(),
            subordinates: &subordinates,
        };

        for rule in held_rules {
            match rule.relationship().bind(&context) {
                Some(clause) => predicate.push(clause),
                None => debug!(
                    subject = principal.subject(),
                    permission = rule.permission().map(|permission| permission.as_str()),
                    "skipped actor-anchored rule for principal without actor"
                ),
            }
        }

        debug!(
            subject = principal.subject(),
            resource_type = rule_set.resource_type().as_str(),
            operation = rule_set.operation().as_str(),
            clause_count = predicate.clauses().len(),
            grants_all = predicate.grants_all(),
            "built access predicate"
        );

        Ok(predicate)
    }
}
