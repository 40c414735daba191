use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use bizdock_core::{AppError, NonEmptyString, UserIdentity};
use subtle::ConstantTimeEq;
use tower_sessions::Session;
use tracing::info;

use crate::dto::{IssueSessionRequest, UserIdentityResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub const SESSION_USER_KEY: &str = "user_identity";
pub const SESSION_CREATED_AT_KEY: &str = "session_created_at";

/// Reads the identity bound to the session, if any.
pub async fn session_identity(session: &Session) -> Result<Option<UserIdentity>, AppError> {
    session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))
}

/// Binds an upstream-authenticated subject to the session.
///
/// The subject must resolve to an active principal, so sessions are never
/// issued for accounts the engine cannot evaluate.
pub async fn issue_session_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<IssueSessionRequest>,
) -> ApiResult<Json<UserIdentityResponse>> {
    if !issuer_token_matches(&payload.token, &state.session_issuer_token) {
        return Err(AppError::SessionResolution("invalid session issuer token".to_owned()).into());
    }

    let subject = String::from(NonEmptyString::new(payload.subject)?);
    let display_name = payload
        .display_name
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| subject.clone());
    let identity = UserIdentity::new(subject, display_name, payload.email);
    let principal = state.access_service.principal(&identity).await?;

    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;
    session
        .insert(SESSION_USER_KEY, &identity)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session identity: {error}"))
        })?;
    session
        .insert(SESSION_CREATED_AT_KEY, chrono::Utc::now().timestamp())
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session timestamp: {error}"))
        })?;

    info!(subject = identity.subject(), "session issued");

    Ok(Json(UserIdentityResponse::from_principal(
        &identity, &principal,
    )))
}

fn issuer_token_matches(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    let subject = session_identity(&session)
        .await?
        .map(|identity| identity.subject().to_owned());

    session
        .flush()
        .await
        .map_err(|error| AppError::Internal(format!("failed to flush session: {error}")))?;

    if let Some(subject) = subject {
        info!(subject = subject.as_str(), "session closed");
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn me_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<Json<UserIdentityResponse>> {
    let principal = state.access_service.principal(&identity).await?;

    Ok(Json(UserIdentityResponse::from_principal(
        &identity, &principal,
    )))
}
