use std::sync::Arc;

use bizdock_application::{AccessDecisionService, AccessEngineConfig};
use bizdock_core::{ResourceId, UserIdentity};
use bizdock_domain::{
    AccessRuleRegistry, FilterCondition, FilterGroup, FilterOperator, Operation, PageRequest,
    RegistryOptions, ResourceType, SortDirection, SortKey,
};
use serde_json::{Value, json};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use super::PostgresResourceStore;
use crate::{PostgresActorHierarchyRepository, PostgresPrincipalRepository};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres resource store tests: {error}");
    }

    Some(pool)
}

/// Identifier range unique to one test run, so parallel tests never collide.
fn id_base() -> i64 {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();

    i64::try_from(nanos % 1_000_000_000_000).unwrap_or_default() * 1_000
}

async fn insert_principal(pool: &PgPool, subject: &str, permissions: &[&str]) {
    let insert = sqlx::query("INSERT INTO principals (subject, display_name) VALUES ($1, $1)")
        .bind(subject)
        .execute(pool)
        .await;
    assert!(insert.is_ok());

    let role_name = format!("role-{subject}");
    let role_id: Result<(i64,), sqlx::Error> =
        sqlx::query_as("INSERT INTO rbac_roles (name) VALUES ($1) RETURNING id")
            .bind(role_name.as_str())
            .fetch_one(pool)
            .await;
    let Ok((role_id,)) = role_id else {
        panic!("failed to insert role");
    };

    for permission in permissions {
        let grant =
            sqlx::query("INSERT INTO rbac_role_grants (role_id, permission) VALUES ($1, $2)")
                .bind(role_id)
                .bind(*permission)
                .execute(pool)
                .await;
        assert!(grant.is_ok());
    }

    let assignment = sqlx::query("INSERT INTO rbac_subject_roles (subject, role_id) VALUES ($1, $2)")
        .bind(subject)
        .bind(role_id)
        .execute(pool)
        .await;
    assert!(assignment.is_ok());
}

async fn insert_actor(pool: &PgPool, id: i64, uid: Option<&str>, manager_id: Option<i64>) {
    let insert = sqlx::query("INSERT INTO actors (id, uid, manager_id) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(uid)
        .bind(manager_id)
        .execute(pool)
        .await;
    assert!(insert.is_ok());
}

async fn insert_resource(
    pool: &PgPool,
    resource_type: ResourceType,
    id: i64,
    deleted: bool,
    data: Value,
) {
    let insert = sqlx::query(
        "INSERT INTO access_resources (resource_type, id, deleted, data) VALUES ($1, $2, $3, $4)",
    )
    .bind(resource_type.as_str())
    .bind(id)
    .bind(deleted)
    .bind(data)
    .execute(pool)
    .await;
    assert!(insert.is_ok());
}

fn service(pool: &PgPool) -> AccessDecisionService {
    AccessDecisionService::new(
        Arc::new(AccessRuleRegistry::bizdock(&RegistryOptions::default())),
        Arc::new(PostgresPrincipalRepository::new(pool.clone())),
        Arc::new(PostgresActorHierarchyRepository::new(pool.clone())),
        Arc::new(PostgresResourceStore::new(pool.clone())),
        AccessEngineConfig::default(),
    )
}

#[tokio::test]
async fn portfolio_manager_listing_matches_single_checks() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let base = id_base();
    let subject = format!("manager-{base}");
    insert_principal(&pool, &subject, &["PORTFOLIO_VIEW_DETAILS_AS_MANAGER_PERMISSION"]).await;
    insert_actor(&pool, base + 42, Some(&subject), None).await;
    insert_resource(&pool, ResourceType::Portfolio, base + 7, false, json!({"manager_id": base + 42})).await;
    insert_resource(&pool, ResourceType::Portfolio, base + 8, false, json!({"manager_id": base + 99})).await;
    insert_resource(&pool, ResourceType::Portfolio, base + 9, true, json!({"manager_id": base + 42})).await;

    let service = service(&pool);
    let identity = UserIdentity::new(subject.as_str(), "Manager", None);

    let listed = service
        .fetch_accessible(
            &identity,
            ResourceType::Portfolio,
            None,
            &[],
            PageRequest::default(),
        )
        .await;
    assert!(matches!(
        listed,
        Ok(records) if records.iter().map(|record| record.id().value()).collect::<Vec<_>>() == vec![base + 7]
    ));

    for (id, expected) in [(base + 7, true), (base + 8, false), (base + 9, false)] {
        let decision = service
            .can_access(
                &identity,
                ResourceType::Portfolio,
                ResourceId::new(id),
                Operation::View,
            )
            .await;
        assert!(matches!(decision, Ok(value) if value == expected), "portfolio {id}");
    }
}

#[tokio::test]
async fn subordinate_scope_and_array_fields_compile_to_sql() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let base = id_base();
    let subject = format!("lead-{base}");
    insert_principal(
        &pool,
        &subject,
        &[
            "BUDGET_BUCKET_VIEW_AS_OWNER_PERMISSION",
            "PORTFOLIO_ENTRY_VIEW_DETAILS_AS_STAKEHOLDER_PERMISSION",
        ],
    )
    .await;
    insert_actor(&pool, base + 1, Some(&subject), None).await;
    insert_actor(&pool, base + 2, None, Some(base + 1)).await;
    insert_actor(&pool, base + 3, None, Some(base + 2)).await;

    insert_resource(&pool, ResourceType::BudgetBucket, base + 10, false, json!({"owner_id": base + 3, "name": "Ops"})).await;
    insert_resource(&pool, ResourceType::BudgetBucket, base + 11, false, json!({"owner_id": base + 50, "name": "IT"})).await;
    insert_resource(&pool, ResourceType::BudgetBucket, base + 12, false, json!({"owner_id": null, "name": "HR"})).await;
    insert_resource(&pool, ResourceType::PortfolioEntry, base + 20, false, json!({"stakeholder_actor_ids": [base + 9, base + 1]})).await;
    insert_resource(&pool, ResourceType::PortfolioEntry, base + 21, false, json!({"portfolio_stakeholder_actor_ids": [base + 1]})).await;
    insert_resource(&pool, ResourceType::PortfolioEntry, base + 22, false, json!({"stakeholder_actor_ids": [base + 9]})).await;

    let service = service(&pool);
    let identity = UserIdentity::new(subject.as_str(), "Lead", None);

    let buckets = service
        .fetch_accessible(
            &identity,
            ResourceType::BudgetBucket,
            None,
            &[],
            PageRequest::default(),
        )
        .await;
    assert!(matches!(
        buckets,
        Ok(records) if records.iter().map(|record| record.id().value()).collect::<Vec<_>>() == vec![base + 10]
    ));

    let filter = match FilterCondition::new("id", FilterOperator::Gte, json!(base + 20)) {
        Ok(condition) => FilterGroup::condition(condition),
        Err(error) => panic!("invalid condition: {error}"),
    };
    let order = match SortKey::new("id", SortDirection::Desc) {
        Ok(key) => vec![key],
        Err(error) => panic!("invalid sort key: {error}"),
    };
    let entries = service
        .fetch_accessible(
            &identity,
            ResourceType::PortfolioEntry,
            Some(&filter),
            &order,
            PageRequest::default(),
        )
        .await;
    assert!(matches!(
        entries,
        Ok(records) if records.iter().map(|record| record.id().value()).collect::<Vec<_>>() == vec![base + 21, base + 20]
    ));
}

#[tokio::test]
async fn soft_deleted_manager_keeps_reports_in_scope() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let base = id_base();
    let subject = format!("head-{base}");
    insert_principal(&pool, &subject, &["ORG_UNIT_VIEW_AS_RESPONSIBLE_PERMISSION"]).await;
    insert_actor(&pool, base + 1, Some(&subject), None).await;
    insert_actor(&pool, base + 2, None, Some(base + 1)).await;
    insert_actor(&pool, base + 3, None, Some(base + 2)).await;
    let deleted = sqlx::query("UPDATE actors SET deleted = TRUE WHERE id = $1")
        .bind(base + 2)
        .execute(&pool)
        .await;
    assert!(deleted.is_ok());
    insert_resource(&pool, ResourceType::OrgUnit, base + 30, false, json!({"manager_id": base + 3})).await;

    let decision = service(&pool)
        .can_access(
            &UserIdentity::new(subject.as_str(), "Head", None),
            ResourceType::OrgUnit,
            ResourceId::new(base + 30),
            Operation::View,
        )
        .await;
    assert!(matches!(decision, Ok(true)));
}

#[tokio::test]
async fn mixed_type_sort_values_follow_jsonb_type_order() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let base = id_base();
    let subject = format!("reader-{base}");
    insert_principal(&pool, &subject, &["RELEASE_VIEW_ALL_PERMISSION"]).await;
    insert_resource(&pool, ResourceType::Release, base + 1, false, json!({"name": ["b"]})).await;
    insert_resource(&pool, ResourceType::Release, base + 2, false, json!({"name": true})).await;
    insert_resource(&pool, ResourceType::Release, base + 3, false, json!({"name": 10})).await;
    insert_resource(&pool, ResourceType::Release, base + 4, false, json!({"name": "zeta"})).await;

    let range = [
        FilterCondition::new("id", FilterOperator::Gte, json!(base)),
        FilterCondition::new("id", FilterOperator::Lt, json!(base + 100)),
    ];
    let filter = match range {
        [Ok(lower), Ok(upper)] => FilterGroup::condition(upper).and_condition(lower),
        _ => panic!("invalid range conditions"),
    };
    let order = match SortKey::new("name", SortDirection::Asc) {
        Ok(key) => vec![key],
        Err(error) => panic!("invalid sort key: {error}"),
    };
    let listed = service(&pool)
        .fetch_accessible(
            &UserIdentity::new(subject.as_str(), "Reader", None),
            ResourceType::Release,
            Some(&filter),
            &order,
            PageRequest::default(),
        )
        .await;
    assert!(matches!(
        listed,
        Ok(records) if records.iter().map(|record| record.id().value()).collect::<Vec<_>>()
            == vec![base + 4, base + 3, base + 2, base + 1]
    ));
}
