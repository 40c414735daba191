use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use bizdock_core::{ActorId, AppError};
use bizdock_domain::ResourceType;
use bizdock_infrastructure::InMemoryAccessDirectory;
use serde_json::json;

use super::{access_decision_handler, list_access_records_handler, query_access_records_handler};
use crate::dto::{AccessDecisionQuery, AccessRecordListQuery, QueryAccessRecordsRequest};
use crate::test_support::{app_state, identity, principal, record};

async fn portfolio_directory() -> Arc<InMemoryAccessDirectory> {
    let directory = Arc::new(InMemoryAccessDirectory::new());
    directory
        .insert_principal(principal(
            "manager",
            &["PORTFOLIO_VIEW_DETAILS_AS_MANAGER_PERMISSION"],
            Some(42),
        ))
        .await;
    directory
        .insert_principal(principal("nobody", &[], None))
        .await;
    directory
        .insert_resource(record(
            ResourceType::Portfolio,
            7,
            json!({"manager_id": 42, "name": "Beta"}),
        ))
        .await;
    directory
        .insert_resource(record(
            ResourceType::Portfolio,
            8,
            json!({"manager_id": 99, "name": "Gamma"}),
        ))
        .await;
    directory
        .insert_resource(record(
            ResourceType::Portfolio,
            9,
            json!({"manager_id": 42, "name": "Alpha"}),
        ))
        .await;
    directory
}

fn list_query() -> Query<AccessRecordListQuery> {
    Query(AccessRecordListQuery {
        limit: None,
        offset: None,
    })
}

fn decision_query(operation: Option<&str>) -> Query<AccessDecisionQuery> {
    Query(AccessDecisionQuery {
        operation: operation.map(ToOwned::to_owned),
    })
}

#[tokio::test]
async fn listing_returns_only_managed_portfolios() {
    let state = app_state(portfolio_directory().await);

    let response = list_access_records_handler(
        State(state),
        Extension(identity("manager")),
        Path("portfolio".to_owned()),
        list_query(),
    )
    .await;

    let Ok(Json(records)) = response else {
        panic!("listing should succeed");
    };
    let ids: Vec<i64> = records.iter().map(|record| record.id).collect();
    assert_eq!(ids, vec![7, 9]);
    assert!(records.iter().all(|record| record.resource_type == "portfolio"));
}

#[tokio::test]
async fn principal_without_grants_lists_nothing() {
    let state = app_state(portfolio_directory().await);

    let response = list_access_records_handler(
        State(state),
        Extension(identity("nobody")),
        Path("portfolio".to_owned()),
        list_query(),
    )
    .await;

    assert!(matches!(response, Ok(Json(records)) if records.is_empty()));
}

#[tokio::test]
async fn query_applies_where_clause_and_sort_inside_access() {
    let state = app_state(portfolio_directory().await);
    let payload: QueryAccessRecordsRequest = match serde_json::from_value(json!({
        "where": {
            "logical_mode": "or",
            "conditions": [
                {"field": "name", "operator": "eq", "value": "Alpha"},
                {"field": "name", "operator": "eq", "value": "Gamma"}
            ]
        },
        "sort": [{"field": "name", "direction": "desc"}]
    })) {
        Ok(payload) => payload,
        Err(error) => panic!("invalid payload: {error}"),
    };

    let response = query_access_records_handler(
        State(state),
        Extension(identity("manager")),
        Path("portfolio".to_owned()),
        Json(payload),
    )
    .await;

    let Ok(Json(records)) = response else {
        panic!("query should succeed");
    };
    // Gamma matches the filter but is outside the manager's access.
    let ids: Vec<i64> = records.iter().map(|record| record.id).collect();
    assert_eq!(ids, vec![9]);
}

#[tokio::test]
async fn unknown_resource_type_is_a_bad_request() {
    let state = app_state(portfolio_directory().await);

    let response = list_access_records_handler(
        State(state),
        Extension(identity("manager")),
        Path("invoice".to_owned()),
        list_query(),
    )
    .await;

    let Err(error) = response else {
        panic!("unknown resource types must be rejected");
    };
    assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_session_subject_is_unauthorized() {
    let state = app_state(portfolio_directory().await);

    let response = list_access_records_handler(
        State(state),
        Extension(identity("ghost")),
        Path("portfolio".to_owned()),
        list_query(),
    )
    .await;

    let Err(error) = response else {
        panic!("unknown subjects must be rejected");
    };
    assert!(matches!(error.0, AppError::SessionResolution(_)));
    assert_eq!(error.into_response().status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn decision_agrees_with_listing() {
    let state = app_state(portfolio_directory().await);

    for (id, expected) in [(7, true), (8, false), (9, true)] {
        let response = access_decision_handler(
            State(state.clone()),
            Extension(identity("manager")),
            Path(("portfolio".to_owned(), id)),
            decision_query(None),
        )
        .await;

        let Ok(Json(decision)) = response else {
            panic!("decision should succeed for portfolio {id}");
        };
        assert_eq!(decision.allowed, expected, "portfolio {id}");
        assert!(decision.determined);
        assert_eq!(decision.operation, "view");
    }
}

#[tokio::test]
async fn undefined_operation_is_a_bad_request() {
    let state = app_state(portfolio_directory().await);

    let response = access_decision_handler(
        State(state),
        Extension(identity("manager")),
        Path(("release".to_owned(), 1)),
        decision_query(Some("approve")),
    )
    .await;

    let Err(error) = response else {
        panic!("undefined operations must be rejected");
    };
    assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cyclic_hierarchy_fails_closed_on_decisions() {
    let directory = Arc::new(InMemoryAccessDirectory::new());
    directory
        .insert_principal(principal(
            "owner",
            &["BUDGET_BUCKET_VIEW_AS_OWNER_PERMISSION"],
            Some(1),
        ))
        .await;
    directory
        .insert_actor(ActorId::new(1), Some(ActorId::new(2)))
        .await;
    directory
        .insert_actor(ActorId::new(2), Some(ActorId::new(1)))
        .await;
    directory
        .insert_resource(record(ResourceType::BudgetBucket, 5, json!({"owner_id": 1})))
        .await;
    let state = app_state(directory);

    let decision = access_decision_handler(
        State(state.clone()),
        Extension(identity("owner")),
        Path(("budget_bucket".to_owned(), 5)),
        decision_query(Some("view")),
    )
    .await;
    assert!(matches!(
        decision,
        Ok(Json(response)) if !response.allowed && !response.determined
    ));

    let listing = list_access_records_handler(
        State(state),
        Extension(identity("owner")),
        Path("budget_bucket".to_owned()),
        list_query(),
    )
    .await;
    let Err(error) = listing else {
        panic!("listing must not hide a resolution failure");
    };
    assert_eq!(
        error.into_response().status(),
        StatusCode::SERVICE_UNAVAILABLE
    );
}
