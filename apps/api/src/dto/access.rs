use std::str::FromStr;

use bizdock_core::{AppError, AppResult};
use bizdock_domain::{
    DEFAULT_PAGE_LIMIT, FilterCondition, FilterGroup, FilterNode, FilterOperator, LogicalMode,
    PageRequest, ResourceRecord, SortDirection, SortKey,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

/// Deepest filter group nesting accepted from callers.
const MAX_FILTER_DEPTH: usize = 8;

/// Paging parameters of the record listing.
#[derive(Debug, Deserialize)]
pub struct AccessRecordListQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl AccessRecordListQuery {
    pub fn page(&self) -> AppResult<PageRequest> {
        page_request(self.limit, self.offset)
    }
}

/// Incoming filter condition.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/access-filter-condition-request.ts"
)]
pub struct AccessFilterConditionRequest {
    pub field: String,
    #[ts(type = "\"eq\" | \"neq\" | \"gt\" | \"gte\" | \"lt\" | \"lte\" | \"contains\" | \"in\"")]
    pub operator: String,
    #[ts(type = "unknown")]
    pub value: Value,
}

/// Incoming filter group. Conditions come before nested groups.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/access-filter-group-request.ts"
)]
pub struct AccessFilterGroupRequest {
    #[ts(type = "\"and\" | \"or\" | null")]
    pub logical_mode: Option<String>,
    pub conditions: Option<Vec<AccessFilterConditionRequest>>,
    pub groups: Option<Vec<AccessFilterGroupRequest>>,
}

/// Incoming sort key.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/access-sort-request.ts"
)]
pub struct AccessSortRequest {
    pub field: String,
    #[ts(type = "\"asc\" | \"desc\" | null")]
    pub direction: Option<String>,
}

/// Incoming record query payload.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/query-access-records-request.ts"
)]
pub struct QueryAccessRecordsRequest {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    #[serde(rename = "where")]
    pub where_clause: Option<AccessFilterGroupRequest>,
    pub sort: Option<Vec<AccessSortRequest>>,
}

impl QueryAccessRecordsRequest {
    pub fn page(&self) -> AppResult<PageRequest> {
        page_request(self.limit, self.offset)
    }

    pub fn filter(&self) -> AppResult<Option<FilterGroup>> {
        self.where_clause
            .as_ref()
            .map(|group| filter_group(group, 1))
            .transpose()
    }

    pub fn order(&self) -> AppResult<Vec<SortKey>> {
        self.sort
            .iter()
            .flatten()
            .map(|key| {
                let direction = key
                    .direction
                    .as_deref()
                    .map(SortDirection::from_str)
                    .transpose()?
                    .unwrap_or(SortDirection::Asc);
                SortKey::new(key.field.as_str(), direction)
            })
            .collect()
    }
}

fn page_request(limit: Option<u32>, offset: Option<u32>) -> AppResult<PageRequest> {
    PageRequest::new(limit.unwrap_or(DEFAULT_PAGE_LIMIT), offset.unwrap_or(0))
}

fn filter_group(request: &AccessFilterGroupRequest, depth: usize) -> AppResult<FilterGroup> {
    if depth > MAX_FILTER_DEPTH {
        return Err(AppError::Validation(format!(
            "filter groups may nest at most {MAX_FILTER_DEPTH} levels"
        )));
    }

    let logical_mode = request
        .logical_mode
        .as_deref()
        .map(LogicalMode::from_str)
        .transpose()?
        .unwrap_or(LogicalMode::And);

    let mut nodes = Vec::new();
    for condition in request.conditions.iter().flatten() {
        let operator = FilterOperator::from_str(condition.operator.as_str())?;
        nodes.push(FilterNode::Condition(FilterCondition::new(
            condition.field.as_str(),
            operator,
            condition.value.clone(),
        )?));
    }
    for group in request.groups.iter().flatten() {
        nodes.push(FilterNode::Group(filter_group(group, depth + 1)?));
    }

    FilterGroup::new(logical_mode, nodes)
}

/// Query parameters of a single access decision.
#[derive(Debug, Deserialize)]
pub struct AccessDecisionQuery {
    pub operation: Option<String>,
}

/// API representation of an accessible record.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/access-record-response.ts"
)]
pub struct AccessRecordResponse {
    #[ts(type = "number")]
    pub id: i64,
    pub resource_type: String,
    #[ts(type = "Record<string, unknown>")]
    pub data: Value,
}

impl From<ResourceRecord> for AccessRecordResponse {
    fn from(record: ResourceRecord) -> Self {
        Self {
            id: record.id().value(),
            resource_type: record.resource_type().as_str().to_owned(),
            data: record.data().clone(),
        }
    }
}

/// Outcome of a single access decision.
///
/// `determined` is false when relationships could not be resolved; `allowed`
/// is then always false.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/access-decision-response.ts"
)]
pub struct AccessDecisionResponse {
    pub resource_type: String,
    #[ts(type = "number")]
    pub resource_id: i64,
    pub operation: String,
    pub allowed: bool,
    pub determined: bool,
}
