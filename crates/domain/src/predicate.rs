use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{AccessField, AccessValue, ResourceRecord};

/// Typed access clause evaluated against a resource record.
///
/// Storage adapters translate clauses into their native filter expressions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccessClause {
    /// Always true: the principal holds the blanket permission.
    BlanketPermission,
    /// Field equals the value. Array fields match when any element equals it.
    FieldEquals {
        /// Record field.
        field: AccessField,
        /// Expected value.
        value: AccessValue,
    },
    /// Field is one of the values. Array fields match when any element is one of them.
    FieldInCollection {
        /// Record field.
        field: AccessField,
        /// Accepted values; an empty collection never matches.
        values: Vec<AccessValue>,
    },
    /// Every nested clause matches. An empty conjunction never matches.
    AllOf {
        /// Nested clauses.
        clauses: Vec<AccessClause>,
    },
    /// Any nested clause matches. An empty disjunction never matches.
    AnyOf {
        /// Nested clauses.
        clauses: Vec<AccessClause>,
    },
}

impl AccessClause {
    /// Returns whether the clause holds for the record.
    #[must_use]
    pub fn matches(&self, record: &ResourceRecord) -> bool {
        match self {
            Self::BlanketPermission => true,
            Self::FieldEquals { field, value } => {
                field_matches(record, *field, |stored| value.matches_json(stored))
            }
            Self::FieldInCollection { field, values } => field_matches(record, *field, |stored| {
                values.iter().any(|value| value.matches_json(stored))
            }),
            Self::AllOf { clauses } => {
                !clauses.is_empty() && clauses.iter().all(|clause| clause.matches(record))
            }
            Self::AnyOf { clauses } => clauses.iter().any(|clause| clause.matches(record)),
        }
    }
}

fn field_matches(
    record: &ResourceRecord,
    field: AccessField,
    predicate: impl Fn(&Value) -> bool,
) -> bool {
    match record.field_value(field.as_str()) {
        Some(Value::Array(elements)) => elements.iter().any(predicate),
        Some(stored) => predicate(&stored),
        None => false,
    }
}

/// Disjunction of access clauses computed for one principal and rule set.
///
/// The empty predicate denies everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPredicate {
    clauses: Vec<AccessClause>,
}

impl AccessPredicate {
    /// Creates the predicate that denies every record.
    #[must_use]
    pub fn deny_all() -> Self {
        Self::default()
    }

    /// Creates a predicate from OR-ed clauses.
    #[must_use]
    pub fn from_clauses(clauses: Vec<AccessClause>) -> Self {
        Self { clauses }
    }

    /// Adds one OR-ed clause.
    pub fn push(&mut self, clause: AccessClause) {
        self.clauses.push(clause);
    }

    /// Returns the OR-ed clauses.
    #[must_use]
    pub fn clauses(&self) -> &[AccessClause] {
        &self.clauses
    }

    /// Returns whether no clause can ever match.
    #[must_use]
    pub fn is_deny_all(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Returns whether the blanket clause is present.
    #[must_use]
    pub fn grants_all(&self) -> bool {
        self.clauses
            .iter()
            .any(|clause| matches!(clause, AccessClause::BlanketPermission))
    }

    /// Returns whether any clause holds for the record.
    #[must_use]
    pub fn matches(&self, record: &ResourceRecord) -> bool {
        self.clauses.iter().any(|clause| clause.matches(record))
    }
}
