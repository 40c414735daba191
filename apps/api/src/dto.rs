mod access;
mod common;

pub use access::{
    AccessDecisionQuery, AccessDecisionResponse, AccessFilterConditionRequest,
    AccessFilterGroupRequest, AccessRecordListQuery, AccessRecordResponse, AccessSortRequest,
    QueryAccessRecordsRequest,
};
pub use common::{HealthResponse, IssueSessionRequest, UserIdentityResponse};
