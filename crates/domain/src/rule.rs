use std::collections::BTreeSet;

use bizdock_core::ActorId;
use serde::{Deserialize, Serialize};

use crate::{AccessClause, AccessField, AccessValue, Operation, Permission, ResourceType};

/// Relationship between the principal and a record, evaluated per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Relationship {
    /// The record is the principal's own actor.
    IsPrincipalActor,
    /// The field references the principal's actor.
    ActorIs {
        /// Record field holding actor identifiers.
        field: AccessField,
    },
    /// The field references the principal's actor or one of its subordinates.
    ActorOrSubordinateIs {
        /// Record field holding actor identifiers.
        field: AccessField,
    },
    /// A record flag has the given value. Needs no actor.
    FlagIs {
        /// Boolean record field.
        field: AccessField,
        /// Expected flag value.
        value: bool,
    },
    /// The principal's subject is listed in the field. Needs no actor.
    PrincipalListedIn {
        /// Record field holding account subjects.
        field: AccessField,
    },
    /// Every nested relationship holds.
    AllOf {
        /// Nested relationships.
        relationships: Vec<Relationship>,
    },
    /// Any nested relationship holds.
    AnyOf {
        /// Nested relationships.
        relationships: Vec<Relationship>,
    },
}

impl Relationship {
    /// Returns whether any leaf is anchored on the linked actor.
    #[must_use]
    pub fn requires_actor(&self) -> bool {
        match self {
            Self::IsPrincipalActor | Self::ActorIs { .. } | Self::ActorOrSubordinateIs { .. } => {
                true
            }
            Self::FlagIs { .. } | Self::PrincipalListedIn { .. } => false,
            Self::AllOf { relationships } | Self::AnyOf { relationships } => {
                relationships.iter().any(Self::requires_actor)
            }
        }
    }

    /// Returns whether any leaf needs the subordinate closure of the actor.
    #[must_use]
    pub fn requires_subordinates(&self) -> bool {
        match self {
            Self::ActorOrSubordinateIs { .. } => true,
            Self::AllOf { relationships } | Self::AnyOf { relationships } => {
                relationships.iter().any(Self::requires_subordinates)
            }
            _ => false,
        }
    }

    /// Binds the relationship to resolved principal facts.
    ///
    /// Returns `None` when an actor-anchored leaf has no linked actor.
    #[must_use]
    pub fn bind(&self, context: &RelationshipContext<'_>) -> Option<AccessClause> {
        match self {
            Self::IsPrincipalActor => context.actor_id.map(|actor_id| AccessClause::FieldEquals {
                field: AccessField::Id,
                value: AccessValue::Int(actor_id.value()),
            }),
            Self::ActorIs { field } => context.actor_id.map(|actor_id| AccessClause::FieldEquals {
                field: *field,
                value: AccessValue::Int(actor_id.value()),
            }),
            Self::ActorOrSubordinateIs { field } => {
                let actor_id = context.actor_id?;
                let mut values = vec![AccessValue::Int(actor_id.value())];
                values.extend(
                    context
                        .subordinates
                        .iter()
                        .filter(|subordinate| **subordinate != actor_id)
                        .map(|subordinate| AccessValue::Int(subordinate.value())),
                );

                Some(AccessClause::FieldInCollection {
                    field: *field,
                    values,
                })
            }
            Self::FlagIs { field, value } => Some(AccessClause::FieldEquals {
                field: *field,
                value: AccessValue::Bool(*value),
            }),
            Self::PrincipalListedIn { field } => Some(AccessClause::FieldEquals {
                field: *field,
                value: AccessValue::Text(context.subject.to_owned()),
            }),
            Self::AllOf { relationships } => relationships
                .iter()
                .map(|relationship| relationship.bind(context))
                .collect::<Option<Vec<_>>>()
                .map(|clauses| AccessClause::AllOf { clauses }),
            Self::AnyOf { relationships } => {
                let clauses: Vec<AccessClause> = relationships
                    .iter()
                    .filter_map(|relationship| relationship.bind(context))
                    .collect();

                (!clauses.is_empty()).then_some(AccessClause::AnyOf { clauses })
            }
        }
    }
}

/// Principal facts a relationship is bound against.
#[derive(Debug, Clone, Copy)]
pub struct RelationshipContext<'a> {
    /// Account subject of the principal.
    pub subject: &'a str,
    /// Linked business actor.
    pub actor_id: Option<ActorId>,
    /// Subordinate closure of the actor, empty when not resolved.
    pub subordinates: &'a BTreeSet<ActorId>,
}

/// One OR-ed access rule: a permission and the relationship it unlocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRule {
    permission: Option<Permission>,
    relationship: Relationship,
}

impl AccessRule {
    /// Creates a rule unlocked by a permission.
    #[must_use]
    pub fn granted_by(permission: Permission, relationship: Relationship) -> Self {
        Self {
            permission: Some(permission),
            relationship,
        }
    }

    /// Creates a rule that applies to every principal.
    #[must_use]
    pub fn implicit(relationship: Relationship) -> Self {
        Self {
            permission: None,
            relationship,
        }
    }

    /// Returns the unlocking permission, `None` for implicit rules.
    #[must_use]
    pub fn permission(&self) -> Option<Permission> {
        self.permission
    }

    /// Returns the relationship template.
    #[must_use]
    pub fn relationship(&self) -> &Relationship {
        &self.relationship
    }
}

/// Ordered rules for one resource type and operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRuleSet {
    resource_type: ResourceType,
    operation: Operation,
    blanket: Option<Permission>,
    rules: Vec<AccessRule>,
    guards: Vec<AccessClause>,
}

impl AccessRuleSet {
    /// Creates an empty rule set.
    #[must_use]
    pub fn new(resource_type: ResourceType, operation: Operation) -> Self {
        Self {
            resource_type,
            operation,
            blanket: None,
            rules: Vec::new(),
            guards: Vec::new(),
        }
    }

    /// Sets the permission granting every record.
    #[must_use]
    pub fn with_blanket(mut self, permission: Permission) -> Self {
        self.blanket = Some(permission);
        self
    }

    /// Appends an OR-ed rule.
    #[must_use]
    pub fn with_rule(mut self, rule: AccessRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Appends a record constraint AND-ed with the whole predicate.
    #[must_use]
    pub fn with_guard(mut self, guard: AccessClause) -> Self {
        self.guards.push(guard);
        self
    }

    /// Returns the resource type.
    #[must_use]
    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// Returns the operation.
    #[must_use]
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Returns the blanket permission.
    #[must_use]
    pub fn blanket(&self) -> Option<Permission> {
        self.blanket
    }

    /// Returns the ordered rules.
    #[must_use]
    pub fn rules(&self) -> &[AccessRule] {
        &self.rules
    }

    /// Returns the guards.
    #[must_use]
    pub fn guards(&self) -> &[AccessClause] {
        &self.guards
    }
}
