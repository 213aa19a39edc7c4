use axum::{extract::State, http::HeaderMap, Extension, Json};
use tracing::{error, info, instrument, warn};

use super::{
    middleware::extract_access_token,
    service::SessionError,
    types::{
        AuthenticatedUser, IdentityResponse, LoginRequest, MessageResponse, RefreshRequest,
        TokenPair,
    },
};
use crate::shared::{AppError, AppState};
use crate::user::password::{verify_password, PasswordError};

/// POST /login
/// Checks the password against the stored hash and issues a token pair
#[instrument(name = "login", skip_all)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenPair>, AppError> {
    let credential = state
        .credential_store
        .lookup_credential(&request.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %request.email, "Login attempt for unknown user");
            AppError::NotFound("User not found".to_string())
        })?;

    verify_password(&request.password, &credential.password_hash).map_err(|e| match e {
        PasswordError::Mismatch => {
            warn!(identity = %credential.identity, "Login rejected: wrong password");
            AppError::Unauthorized("Invalid credentials".to_string())
        }
        other => {
            error!(identity = %credential.identity, error = %other, "Stored credential unusable");
            AppError::Internal
        }
    })?;

    let pair = state.session_manager.login(&credential.identity).await?;
    info!(identity = %credential.identity, "Login succeeded");

    Ok(Json(pair))
}

/// POST /token/refresh
/// Exchanges a refresh token for a new pair; the old pair stops working
#[instrument(name = "refresh", skip_all)]
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, AppError> {
    let pair = state
        .session_manager
        .refresh(&request.refresh_token)
        .await?;
    info!("Token pair rotated");

    Ok(Json(pair))
}

/// POST /logout
/// Revokes the session of the presented access token
#[instrument(name = "logout", skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, AppError> {
    let token = extract_access_token(&headers).ok_or(SessionError::MissingCredentials)?;
    state.session_manager.logout(token).await?;

    Ok(Json(MessageResponse {
        response: "success".to_string(),
    }))
}

/// GET /me (behind require_auth)
pub async fn me(Extension(user): Extension<AuthenticatedUser>) -> Json<IdentityResponse> {
    Json(IdentityResponse {
        identity: user.identity,
    })
}
