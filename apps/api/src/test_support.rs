use std::sync::Arc;
use std::time::Duration;

use bizdock_application::{AccessDecisionService, AccessEngineConfig};
use bizdock_core::{ActorId, ResourceId, UserIdentity};
use bizdock_domain::{AccessRuleRegistry, Principal, RegistryOptions, ResourceRecord, ResourceType};
use bizdock_infrastructure::InMemoryAccessDirectory;
use serde_json::Value;

use crate::state::AppState;

pub const ISSUER_TOKEN: &str = "issuer-token-with-at-least-32-chars";

pub fn principal(subject: &str, permissions: &[&str], actor_id: Option<i64>) -> Principal {
    match Principal::new(
        subject,
        permissions.iter().copied(),
        actor_id.map(ActorId::new),
    ) {
        Ok(principal) => principal,
        Err(error) => panic!("invalid test principal: {error}"),
    }
}

pub fn record(resource_type: ResourceType, id: i64, data: Value) -> ResourceRecord {
    match ResourceRecord::new(ResourceId::new(id), resource_type, false, data) {
        Ok(record) => record,
        Err(error) => panic!("invalid test record: {error}"),
    }
}

pub fn identity(subject: &str) -> UserIdentity {
    UserIdentity::new(subject, subject, None)
}

pub fn app_state(directory: Arc<InMemoryAccessDirectory>) -> AppState {
    AppState {
        access_service: AccessDecisionService::new(
            Arc::new(AccessRuleRegistry::bizdock(&RegistryOptions::default())),
            directory.clone(),
            directory.clone(),
            directory,
            AccessEngineConfig {
                round_trip_timeout: Duration::from_millis(500),
            },
        ),
        frontend_url: "http://localhost:3000".to_owned(),
        session_issuer_token: ISSUER_TOKEN.to_owned(),
    }
}
