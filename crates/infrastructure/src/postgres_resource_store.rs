use std::str::FromStr;

use async_trait::async_trait;
use bizdock_application::ResourceStore;
use bizdock_core::{AppError, AppResult, ResourceId};
use bizdock_domain::{PageRequest, QueryPlan, ResourceRecord, ResourceType};
use serde_json::Value;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::debug;

mod sql;

use sql::{push_order_by, push_plan_conditions};

/// PostgreSQL-backed resource store over the `access_resources` projection.
///
/// Query plans compile into one parameterized statement.
#[derive(Clone)]
pub struct PostgresResourceStore {
    pool: PgPool,
}

impl PostgresResourceStore {
    /// Creates a store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ResourceRow {
    resource_type: String,
    id: i64,
    deleted: bool,
    data: Value,
}

impl TryFrom<ResourceRow> for ResourceRecord {
    type Error = AppError;

    fn try_from(row: ResourceRow) -> Result<Self, Self::Error> {
        let resource_type = ResourceType::from_str(row.resource_type.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "failed to decode resource type '{}': {error}",
                row.resource_type
            ))
        })?;

        ResourceRecord::new(ResourceId::new(row.id), resource_type, row.deleted, row.data)
            .map_err(|error| AppError::Internal(format!("failed to decode resource row: {error}")))
    }
}

#[async_trait]
impl ResourceStore for PostgresResourceStore {
    async fn count_resources(&self, plan: &QueryPlan) -> AppResult<u64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM access_resources");
        push_plan_conditions(&mut builder, plan);

        let (count,): (i64,) = builder
            .build_query_as()
            .fetch_one(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to count resources: {error}")))?;

        debug!(
            resource_type = plan.resource_type().as_str(),
            operation = plan.operation().as_str(),
            count,
            "counted accessible resources"
        );

        u64::try_from(count)
            .map_err(|error| AppError::Internal(format!("invalid resource count: {error}")))
    }

    async fn list_resources(
        &self,
        plan: &QueryPlan,
        page: PageRequest,
    ) -> AppResult<Vec<ResourceRecord>> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT resource_type, id, deleted, data FROM access_resources",
        );
        push_plan_conditions(&mut builder, plan);
        push_order_by(&mut builder, plan);
        builder.push(" LIMIT ");
        builder.push_bind(i64::from(page.limit()));
        builder.push(" OFFSET ");
        builder.push_bind(i64::from(page.offset()));

        let rows = builder
            .build_query_as::<ResourceRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to list resources: {error}")))?;

        rows.into_iter().map(ResourceRecord::try_from).collect()
    }
}

#[cfg(test)]
mod tests;
