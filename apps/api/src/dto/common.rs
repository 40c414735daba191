use bizdock_core::UserIdentity;
use bizdock_domain::Principal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Payload a trusted upstream issuer sends to bind a subject to the session.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/issue-session-request.ts"
)]
pub struct IssueSessionRequest {
    pub subject: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub token: String,
}

/// API representation of the authenticated user and its resolved access.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/user-identity-response.ts"
)]
pub struct UserIdentityResponse {
    pub subject: String,
    pub display_name: String,
    pub email: Option<String>,
    #[ts(type = "number | null")]
    pub actor_id: Option<i64>,
    pub permissions: Vec<String>,
}

impl UserIdentityResponse {
    /// Creates a response from the session identity and its principal.
    #[must_use]
    pub fn from_principal(identity: &UserIdentity, principal: &Principal) -> Self {
        Self {
            subject: identity.subject().to_owned(),
            display_name: identity.display_name().to_owned(),
            email: identity.email().map(ToOwned::to_owned),
            actor_id: principal.actor_id().map(|actor_id| actor_id.value()),
            permissions: principal.permissions().iter().cloned().collect(),
        }
    }
}
