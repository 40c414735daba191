use bizdock_application::AccessDecisionService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub access_service: AccessDecisionService,
    pub frontend_url: String,
    pub session_issuer_token: String,
}
