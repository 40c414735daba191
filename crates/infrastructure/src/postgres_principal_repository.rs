use async_trait::async_trait;
use bizdock_application::PrincipalRepository;
use bizdock_core::{ActorId, AppError, AppResult};
use bizdock_domain::Principal;
use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed principal lookups from accounts, role grants and actor links.
#[derive(Clone)]
pub struct PostgresPrincipalRepository {
    pool: PgPool,
}

impl PostgresPrincipalRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PrincipalRow {
    subject: String,
    actor_id: Option<i64>,
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    permission: String,
}

#[async_trait]
impl PrincipalRepository for PostgresPrincipalRepository {
    async fn find_principal(&self, subject: &str) -> AppResult<Option<Principal>> {
        let row = sqlx::query_as::<_, PrincipalRow>(
            r#"
            SELECT principals.subject, actors.id AS actor_id
            FROM principals
            LEFT JOIN actors
                ON actors.uid = principals.subject
                AND actors.deleted = FALSE
            WHERE principals.subject = $1
                AND principals.is_active = TRUE
            "#,
        )
        .bind(subject)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load principal: {error}")))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let permissions = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT DISTINCT grants.permission
            FROM rbac_subject_roles AS subject_roles
            INNER JOIN rbac_role_grants AS grants
                ON grants.role_id = subject_roles.role_id
            WHERE subject_roles.subject = $1
            "#,
        )
        .bind(subject)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load permissions: {error}")))?;

        Principal::new(
            row.subject,
            permissions.into_iter().map(|row| row.permission),
            row.actor_id.map(ActorId::new),
        )
        .map(Some)
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to decode principal for subject '{subject}': {error}"
            ))
        })
    }
}
