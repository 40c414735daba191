use std::sync::Arc;

use bizdock_application::{AccessDecisionService, AccessEngineConfig};
use bizdock_domain::{AccessRuleRegistry, RegistryOptions};
use bizdock_infrastructure::{
    PostgresActorHierarchyRepository, PostgresPrincipalRepository, PostgresResourceStore,
};
use sqlx::PgPool;
use tracing::info;

use crate::api_config::ApiConfig;
use crate::state::AppState;

pub fn build_app_state(pool: PgPool, config: &ApiConfig) -> AppState {
    let registry = AccessRuleRegistry::bizdock(&RegistryOptions {
        manage_archived_portfolio_entries: config.manage_archived_portfolio_entries,
    });
    let engine_config = AccessEngineConfig {
        round_trip_timeout: config.round_trip_timeout,
    };

    info!(
        round_trip_timeout_ms = u64::try_from(engine_config.round_trip_timeout.as_millis())
            .unwrap_or(u64::MAX),
        manage_archived_portfolio_entries = config.manage_archived_portfolio_entries,
        "access engine configured"
    );

    AppState {
        access_service: AccessDecisionService::new(
            Arc::new(registry),
            Arc::new(PostgresPrincipalRepository::new(pool.clone())),
            Arc::new(PostgresActorHierarchyRepository::new(pool.clone())),
            Arc::new(PostgresResourceStore::new(pool)),
            engine_config,
        ),
        frontend_url: config.frontend_url.clone(),
        session_issuer_token: config.session_issuer_token.clone(),
    }
}
