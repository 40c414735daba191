use async_trait::async_trait;
use bizdock_application::ActorHierarchyRepository;
use bizdock_core::{ActorId, AppError, AppResult};
use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed actor reporting hierarchy.
#[derive(Clone)]
pub struct PostgresActorHierarchyRepository {
    pool: PgPool,
}

impl PostgresActorHierarchyRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ActorRow {
    id: i64,
}

/// Soft-deleted actors stay in the chain, so their reports remain in scope
/// for the managers above them.
#[async_trait]
impl ActorHierarchyRepository for PostgresActorHierarchyRepository {
    async fn list_direct_reports(&self, managers: &[ActorId]) -> AppResult<Vec<ActorId>> {
        if managers.is_empty() {
            return Ok(Vec::new());
        }

        let manager_ids: Vec<i64> = managers.iter().map(ActorId::value).collect();
        let rows = sqlx::query_as::<_, ActorRow>(
            r#"
            SELECT id
            FROM actors
            WHERE manager_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(manager_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load direct reports: {error}"))
        })?;

        Ok(rows.into_iter().map(|row| ActorId::new(row.id)).collect())
    }
}
