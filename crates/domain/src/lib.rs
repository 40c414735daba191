//! Domain model of BizDock row-level access decisions.

#![forbid(unsafe_code)]

mod predicate;
mod principal;
mod query;
mod registry;
mod resource;
mod rule;
mod security;

pub use predicate::{AccessClause, AccessPredicate};
pub use principal::Principal;
pub use query::{
    DEFAULT_PAGE_LIMIT, FilterCondition, FilterGroup, FilterNode, FilterOperator, LogicalMode,
    MAX_PAGE_LIMIT, PageRequest, QueryPlan, SortDirection, SortKey, compare_json,
    json_sort_order,
};
pub use registry::{AccessRuleRegistry, RegistryOptions};
pub use resource::{AccessField, AccessValue, Operation, ResourceRecord, ResourceType};
pub use rule::{AccessRule, AccessRuleSet, Relationship, RelationshipContext};
pub use security::Permission;
