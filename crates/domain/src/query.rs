use std::cmp::Ordering;
use std::str::FromStr;

use bizdock_core::{AppError, AppResult, NonEmptyString, ResourceId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{AccessClause, AccessField, AccessPredicate, Operation, ResourceRecord, ResourceType};

/// Largest page a listing may request.
pub const MAX_PAGE_LIMIT: u32 = 500;

/// Default page size for listings.
pub const DEFAULT_PAGE_LIMIT: u32 = 50;

/// Sort direction for listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    /// Returns stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl FromStr for SortDirection {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(AppError::Validation(format!(
                "unknown sort direction '{value}'"
            ))),
        }
    }
}

/// Logical mode for filter groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalMode {
    /// All nodes must match.
    And,
    /// Any node may match.
    Or,
}

impl FromStr for LogicalMode {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "and" => Ok(Self::And),
            "or" => Ok(Self::Or),
            _ => Err(AppError::Validation(format!(
                "unknown logical mode '{value}'"
            ))),
        }
    }
}

/// Filter operator for caller filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    /// Equality comparison.
    Eq,
    /// Inequality comparison.
    Neq,
    /// Greater-than comparison.
    Gt,
    /// Greater-than-or-equal comparison.
    Gte,
    /// Less-than comparison.
    Lt,
    /// Less-than-or-equal comparison.
    Lte,
    /// Substring match for text values.
    Contains,
    /// Membership in provided set.
    In,
}

impl FromStr for FilterOperator {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "eq" => Ok(Self::Eq),
            "neq" => Ok(Self::Neq),
            "gt" => Ok(Self::Gt),
            "gte" => Ok(Self::Gte),
            "lt" => Ok(Self::Lt),
            "lte" => Ok(Self::Lte),
            "contains" => Ok(Self::Contains),
            "in" => Ok(Self::In),
            _ => Err(AppError::Validation(format!(
                "unknown filter operator '{value}'"
            ))),
        }
    }
}

/// One caller filter condition over a record field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    field: String,
    operator: FilterOperator,
    value: Value,
}

impl FilterCondition {
    /// Creates a validated filter condition.
    pub fn new(
        field: impl Into<String>,
        operator: FilterOperator,
        value: Value,
    ) -> AppResult<Self> {
        let field = String::from(NonEmptyString::new(field)?);
        let valid = match operator {
            FilterOperator::Eq | FilterOperator::Neq => !value.is_null(),
            FilterOperator::Gt | FilterOperator::Gte | FilterOperator::Lt | FilterOperator::Lte => {
                value.is_number() || value.is_string()
            }
            FilterOperator::Contains => value.is_string(),
            FilterOperator::In => value.is_array(),
        };
        if !valid {
            return Err(AppError::Validation(format!(
                "filter value for field '{field}' does not fit operator '{operator:?}'"
            )));
        }

        Ok(Self {
            field,
            operator,
            value,
        })
    }

    /// Creates the condition selecting one record by identifier.
    #[must_use]
    pub fn identifier(id: ResourceId) -> Self {
        Self {
            field: AccessField::Id.as_str().to_owned(),
            operator: FilterOperator::Eq,
            value: Value::from(id.value()),
        }
    }

    /// Returns the field name.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the operator.
    #[must_use]
    pub fn operator(&self) -> FilterOperator {
        self.operator
    }

    /// Returns the compared value.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Returns whether the condition holds for the record.
    #[must_use]
    pub fn matches(&self, record: &ResourceRecord) -> bool {
        let Some(stored) = record.field_value(&self.field) else {
            return false;
        };

        match self.operator {
            FilterOperator::Eq => stored == self.value,
            FilterOperator::Neq => stored != self.value,
            FilterOperator::Gt => compare_json(&stored, &self.value).is_some_and(Ordering::is_gt),
            FilterOperator::Gte => compare_json(&stored, &self.value).is_some_and(Ordering::is_ge),
            FilterOperator::Lt => compare_json(&stored, &self.value).is_some_and(Ordering::is_lt),
            FilterOperator::Lte => compare_json(&stored, &self.value).is_some_and(Ordering::is_le),
            FilterOperator::Contains => stored
                .as_str()
                .zip(self.value.as_str())
                .map(|(stored, expected)| stored.contains(expected))
                .unwrap_or(false),
            FilterOperator::In => self
                .value
                .as_array()
                .map(|values| values.iter().any(|candidate| candidate == &stored))
                .unwrap_or(false),
        }
    }
}

/// Node inside a caller filter tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterNode {
    /// Leaf condition.
    Condition(FilterCondition),
    /// Nested group.
    Group(FilterGroup),
}

/// Caller filter tree combined with the access predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterGroup {
    logical_mode: LogicalMode,
    nodes: Vec<FilterNode>,
}

impl FilterGroup {
    /// Creates a validated filter group.
    pub fn new(logical_mode: LogicalMode, nodes: Vec<FilterNode>) -> AppResult<Self> {
        if nodes.is_empty() {
            return Err(AppError::Validation(
                "filter group must contain at least one node".to_owned(),
            ));
        }

        Ok(Self {
            logical_mode,
            nodes,
        })
    }

    /// Creates a single-condition group.
    #[must_use]
    pub fn condition(condition: FilterCondition) -> Self {
        Self {
            logical_mode: LogicalMode::And,
            nodes: vec![FilterNode::Condition(condition)],
        }
    }

    /// Returns a new group requiring both this group and the condition.
    #[must_use]
    pub fn and_condition(&self, condition: FilterCondition) -> Self {
        Self {
            logical_mode: LogicalMode::And,
            nodes: vec![
                FilterNode::Condition(condition),
                FilterNode::Group(self.clone()),
            ],
        }
    }

    /// Returns logical mode.
    #[must_use]
    pub fn logical_mode(&self) -> LogicalMode {
        self.logical_mode
    }

    /// Returns nodes.
    #[must_use]
    pub fn nodes(&self) -> &[FilterNode] {
        &self.nodes
    }

    /// Returns whether the group holds for the record.
    #[must_use]
    pub fn matches(&self, record: &ResourceRecord) -> bool {
        let evaluate = |node: &FilterNode| match node {
            FilterNode::Condition(condition) => condition.matches(record),
            FilterNode::Group(group) => group.matches(record),
        };

        match self.logical_mode {
            LogicalMode::And => self.nodes.iter().all(evaluate),
            LogicalMode::Or => self.nodes.iter().any(evaluate),
        }
    }
}

/// Listing order key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    field: NonEmptyString,
    direction: SortDirection,
}

impl SortKey {
    /// Creates a validated sort key.
    pub fn new(field: impl Into<String>, direction: SortDirection) -> AppResult<Self> {
        Ok(Self {
            field: NonEmptyString::new(field)?,
            direction,
        })
    }

    /// Returns the field name.
    #[must_use]
    pub fn field(&self) -> &str {
        self.field.as_str()
    }

    /// Returns the direction.
    #[must_use]
    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    fn compare(&self, left: &ResourceRecord, right: &ResourceRecord) -> Ordering {
        let left_value = left.field_value(self.field.as_str());
        let right_value = right.field_value(self.field.as_str());

        // Missing values sort last in both directions.
        match (left_value, right_value) {
            (Some(left), Some(right)) => {
                let ordering = json_sort_order(&left, &right);
                match self.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

/// Compares two JSON scalars of the same type.
#[must_use]
pub fn compare_json(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => match (left.as_i64(), right.as_i64()) {
            (Some(left), Some(right)) => Some(left.cmp(&right)),
            _ => left
                .as_f64()
                .zip(right.as_f64())
                .and_then(|(left, right)| left.partial_cmp(&right)),
        },
        (Value::String(left), Value::String(right)) => Some(left.cmp(right)),
        (Value::Bool(left), Value::Bool(right)) => Some(left.cmp(right)),
        _ => None,
    }
}

/// Total order over JSON values matching `jsonb` ordering.
///
/// Types rank `null < string < number < boolean < array < object`. Arrays
/// compare by length, then element-wise. Objects compare by pair count, then
/// by keys (shorter first), then by values.
#[must_use]
pub fn json_sort_order(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::String(left), Value::String(right)) => left.cmp(right),
        (Value::Number(left), Value::Number(right)) => compare_numbers(left, right),
        (Value::Bool(left), Value::Bool(right)) => left.cmp(right),
        (Value::Array(left), Value::Array(right)) => left.len().cmp(&right.len()).then_with(|| {
            left.iter()
                .zip(right)
                .map(|(left, right)| json_sort_order(left, right))
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        }),
        (Value::Object(left), Value::Object(right)) => {
            let mut left_keys: Vec<&String> = left.keys().collect();
            let mut right_keys: Vec<&String> = right.keys().collect();
            left_keys.sort_by(|a, b| compare_object_keys(a, b));
            right_keys.sort_by(|a, b| compare_object_keys(a, b));

            left.len()
                .cmp(&right.len())
                .then_with(|| {
                    left_keys
                        .iter()
                        .zip(&right_keys)
                        .map(|(left, right)| compare_object_keys(left, right))
                        .find(|ordering| ordering.is_ne())
                        .unwrap_or(Ordering::Equal)
                })
                .then_with(|| {
                    left_keys
                        .iter()
                        .zip(&right_keys)
                        .map(|(left_key, right_key)| {
                            match (left.get(*left_key), right.get(*right_key)) {
                                (Some(left), Some(right)) => json_sort_order(left, right),
                                _ => Ordering::Equal,
                            }
                        })
                        .find(|ordering| ordering.is_ne())
                        .unwrap_or(Ordering::Equal)
                })
        }
        _ => type_rank(left).cmp(&type_rank(right)),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::String(_) => 1,
        Value::Number(_) => 2,
        Value::Bool(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn compare_object_keys(left: &str, right: &str) -> Ordering {
    left.len().cmp(&right.len()).then_with(|| left.cmp(right))
}

// Float order first, exact integer value to split ties the float rounding hides.
fn compare_numbers(left: &serde_json::Number, right: &serde_json::Number) -> Ordering {
    let approximate = |number: &serde_json::Number| number.as_f64().unwrap_or_default();
    let exact = |number: &serde_json::Number| {
        number
            .as_i64()
            .map(i128::from)
            .or_else(|| number.as_u64().map(i128::from))
    };

    approximate(left)
        .total_cmp(&approximate(right))
        .then_with(|| exact(left).cmp(&exact(right)))
}

/// Listing page bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    limit: u32,
    offset: u32,
}

impl PageRequest {
    /// Creates validated page bounds.
    pub fn new(limit: u32, offset: u32) -> AppResult<Self> {
        if limit == 0 || limit > MAX_PAGE_LIMIT {
            return Err(AppError::Validation(format!(
                "page limit must be between 1 and {MAX_PAGE_LIMIT}"
            )));
        }

        Ok(Self { limit, offset })
    }

    /// Returns the page size.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Returns the number of skipped records.
    #[must_use]
    pub fn offset(&self) -> u32 {
        self.offset
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

/// Augmented listing query: caller filter AND access predicate AND guards
/// AND not deleted, with the caller order applied separately.
///
/// The soft-delete exclusion is implicit and cannot be disabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    resource_type: ResourceType,
    operation: Operation,
    filter: Option<FilterGroup>,
    order: Vec<SortKey>,
    access: AccessPredicate,
    guards: Vec<AccessClause>,
}

impl QueryPlan {
    /// Creates a query plan.
    #[must_use]
    pub fn new(
        resource_type: ResourceType,
        operation: Operation,
        filter: Option<FilterGroup>,
        order: Vec<SortKey>,
        access: AccessPredicate,
        guards: Vec<AccessClause>,
    ) -> Self {
        Self {
            resource_type,
            operation,
            filter,
            order,
            access,
            guards,
        }
    }

    /// Returns the resource type.
    #[must_use]
    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// Returns the operation the plan was built for.
    #[must_use]
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Returns the caller filter.
    #[must_use]
    pub fn filter(&self) -> Option<&FilterGroup> {
        self.filter.as_ref()
    }

    /// Returns the caller order.
    #[must_use]
    pub fn order(&self) -> &[SortKey] {
        &self.order
    }

    /// Returns the access predicate.
    #[must_use]
    pub fn access(&self) -> &AccessPredicate {
        &self.access
    }

    /// Returns the AND-ed record guards.
    #[must_use]
    pub fn guards(&self) -> &[AccessClause] {
        &self.guards
    }

    /// Returns whether the plan can never select a record.
    #[must_use]
    pub fn is_deny_all(&self) -> bool {
        self.access.is_deny_all()
    }

    /// Returns whether the record belongs to the plan's result set.
    #[must_use]
    pub fn matches(&self, record: &ResourceRecord) -> bool {
        record.resource_type() == self.resource_type
            && !record.deleted()
            && self
                .filter
                .as_ref()
                .is_none_or(|filter| filter.matches(record))
            && self.access.matches(record)
            && self.guards.iter().all(|guard| guard.matches(record))
    }

    /// Orders records by the sort keys, then by identifier ascending.
    #[must_use]
    pub fn compare(&self, left: &ResourceRecord, right: &ResourceRecord) -> Ordering {
        self.order
            .iter()
            .map(|key| key.compare(left, right))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
            .then_with(|| left.id().cmp(&right.id()))
    }
}
