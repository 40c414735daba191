use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use bizdock_core::{ResourceId, UserIdentity};
use bizdock_domain::{Operation, ResourceType};
use tracing::warn;

use crate::dto::{
    AccessDecisionQuery, AccessDecisionResponse, AccessRecordListQuery, AccessRecordResponse,
    QueryAccessRecordsRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_access_records_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(resource_type): Path<String>,
    Query(query): Query<AccessRecordListQuery>,
) -> ApiResult<Json<Vec<AccessRecordResponse>>> {
    let resource_type = ResourceType::from_str(resource_type.as_str())?;
    let records = state
        .access_service
        .fetch_accessible(&user, resource_type, None, &[], query.page()?)
        .await?
        .into_iter()
        .map(AccessRecordResponse::from)
        .collect();

    Ok(Json(records))
}

pub async fn query_access_records_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(resource_type): Path<String>,
    Json(payload): Json<QueryAccessRecordsRequest>,
) -> ApiResult<Json<Vec<AccessRecordResponse>>> {
    let resource_type = ResourceType::from_str(resource_type.as_str())?;
    let filter = payload.filter()?;
    let order = payload.order()?;

    let records = state
        .access_service
        .fetch_accessible(
            &user,
            resource_type,
            filter.as_ref(),
            &order,
            payload.page()?,
        )
        .await?
        .into_iter()
        .map(AccessRecordResponse::from)
        .collect();

    Ok(Json(records))
}

/// Answers a single access check. Unresolvable relationships deny.
pub async fn access_decision_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((resource_type, resource_id)): Path<(String, i64)>,
    Query(query): Query<AccessDecisionQuery>,
) -> ApiResult<Json<AccessDecisionResponse>> {
    let resource_type = ResourceType::from_str(resource_type.as_str())?;
    let operation = query
        .operation
        .as_deref()
        .map(Operation::from_str)
        .transpose()?
        .unwrap_or(Operation::View);

    let (allowed, determined) = match state
        .access_service
        .can_access(
            &user,
            resource_type,
            ResourceId::new(resource_id),
            operation,
        )
        .await
    {
        Ok(allowed) => (allowed, true),
        Err(error) if error.is_resolution_failure() => {
            warn!(
                subject = user.subject(),
                resource_type = resource_type.as_str(),
                resource_id,
                operation = operation.as_str(),
                %error,
                "access decision undetermined, denying"
            );
            (false, false)
        }
        Err(error) => return Err(error.into()),
    };

    Ok(Json(AccessDecisionResponse {
        resource_type: resource_type.as_str().to_owned(),
        resource_id,
        operation: operation.as_str().to_owned(),
        allowed,
        determined,
    }))
}

#[cfg(test)]
mod tests;
