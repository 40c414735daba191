use std::sync::Arc;

use bizdock_core::{AppError, AppResult, UserIdentity};
use bizdock_domain::Principal;
use tracing::{debug, warn};

use crate::round_trip::bounded;
use crate::{AccessEngineConfig, PrincipalRepository};

/// Resolves the session identity into the principal used for decisions.
#[derive(Clone)]
pub struct PrincipalResolver {
    repository: Arc<dyn PrincipalRepository>,
    config: AccessEngineConfig,
}

impl PrincipalResolver {
    /// Creates a resolver over a principal repository.
    #[must_use]
    pub fn new(repository: Arc<dyn PrincipalRepository>, config: AccessEngineConfig) -> Self {
        Self { repository, config }
    }

    /// Resolves the principal for the session identity.
    ///
    /// A subject without an active account is a session resolution error.
    pub async fn resolve(&self, identity: &UserIdentity) -> AppResult<Principal> {
        let subject = identity.subject();
        let principal = bounded(
            self.config.round_trip_timeout,
            "principal lookup",
            self.repository.find_principal(subject),
        )
        .await?;

        match principal {
            Some(principal) => {
                debug!(
                    subject,
                    permission_count = principal.permissions().len(),
                    has_actor = principal.actor_id().is_some(),
                    "resolved principal"
                );
                Ok(principal)
            }
            None => {
                warn!(subject, "session subject has no active account");
                Err(AppError::SessionResolution(format!(
                    "no active account for subject '{subject}'"
                )))
            }
        }
    }
}
