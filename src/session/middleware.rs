use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{info, instrument, warn};

use super::{
    service::{SessionError, SessionManager},
    types::AuthenticatedUser,
};
use crate::shared::{AppError, AppState};

/// Cookie consulted when no Authorization header is present
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Pulls the access token from `Authorization: Bearer`, falling back to the cookie
pub fn extract_access_token(headers: &HeaderMap) -> Option<&str> {
    if let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    {
        return value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == ACCESS_TOKEN_COOKIE)
        .map(|(_, token)| token)
        .filter(|token| !token.is_empty())
}

/// Resolves the caller of a request, without touching the request itself.
/// Dispatch code decides what to do with the result.
#[instrument(skip(manager, headers))]
pub async fn authenticate(
    manager: &SessionManager,
    headers: &HeaderMap,
) -> Result<AuthenticatedUser, SessionError> {
    let token = extract_access_token(headers).ok_or_else(|| {
        warn!("No access token in Authorization header or cookie");
        SessionError::MissingCredentials
    })?;

    let identity = manager.validate_access(token).await?;
    Ok(AuthenticatedUser { identity })
}

/// Auth middleware - validates the access token and adds AuthenticatedUser to request.
/// Usage: .layer(middleware::from_fn_with_state(app_state.clone(), session::require_auth))
/// Handlers can then extract Extension(user): Extension<AuthenticatedUser>.
#[instrument(skip(state, req, next))]
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = match authenticate(&state.session_manager, req.headers()).await {
        Ok(user) => user,
        Err(e) => {
            warn!(uri = %req.uri(), "Authentication failed: {}", e);
            return Err(e.into());
        }
    };

    info!(identity = %user.identity, "Authentication successful");
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
