use axum::extract::{Request, State};
use axum::http::{HeaderValue, Method, header};
use axum::middleware::Next;
use axum::response::Response;
use bizdock_core::AppError;
use tower_sessions::Session;

use crate::auth::session_identity;
use crate::error::ApiResult;
use crate::state::AppState;

/// Puts the session identity into request extensions, or rejects with 401.
pub async fn require_auth(
    session: Session,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = session_identity(&session).await?.ok_or_else(|| {
        AppError::SessionResolution("no identity bound to session".to_owned())
    })?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Rejects state-changing requests that do not come from the frontend origin.
pub async fn require_same_origin_for_mutations(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    if is_state_changing_method(request.method()) && !is_same_origin(&state, &request) {
        return Err(AppError::SessionResolution("origin validation failed".to_owned()).into());
    }

    Ok(next.run(request).await)
}

fn is_same_origin(state: &AppState, request: &Request) -> bool {
    let headers = request.headers();

    if headers
        .get("sec-fetch-site")
        .is_some_and(|fetch_site| fetch_site == HeaderValue::from_static("cross-site"))
    {
        return false;
    }

    let origin = headers
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let referer = headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    origin == state.frontend_url || referer.starts_with(state.frontend_url.as_str())
}

fn is_state_changing_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::extract::Request;
    use axum::http::{Method, header};
    use bizdock_infrastructure::InMemoryAccessDirectory;

    use super::is_same_origin;
    use crate::test_support::app_state;

    fn request(headers: &[(header::HeaderName, &str)]) -> Request {
        let mut builder = Request::builder().method(Method::POST).uri("/auth/logout");
        for (name, value) in headers {
            builder = builder.header(name, *value);
        }

        match builder.body(Body::empty()) {
            Ok(request) => request,
            Err(error) => panic!("invalid test request: {error}"),
        }
    }

    #[test]
    fn mutations_without_origin_headers_are_rejected() {
        let state = app_state(Arc::new(InMemoryAccessDirectory::new()));

        assert!(!is_same_origin(&state, &request(&[])));
    }

    #[test]
    fn frontend_origin_or_referer_is_accepted() {
        let state = app_state(Arc::new(InMemoryAccessDirectory::new()));
        let frontend = state.frontend_url.clone();
        let page = format!("{frontend}/portfolios");

        assert!(is_same_origin(&state, &request(&[(header::ORIGIN, frontend.as_str())])));
        assert!(is_same_origin(&state, &request(&[(header::REFERER, page.as_str())])));
        assert!(!is_same_origin(
            &state,
            &request(&[(header::ORIGIN, "https://elsewhere.example")])
        ));
    }
}
