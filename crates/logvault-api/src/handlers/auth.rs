//! Operator login and password management.

use axum::extract::State;
use axum::Json;
use std::sync::Arc;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::{ChangePasswordRequest, LoginRequest, LoginResponse, MessageResponse};
use crate::state::AppState;

/// `POST /api/auth/login`.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("username and password are required"));
    }

    let outcome = state.auth.authenticate(&req.username, &req.password).await?;
    Ok(Json(LoginResponse {
        token: outcome.token,
        expires_at: outcome.expires_at,
        roles: outcome.roles,
    }))
}

/// `POST /api/auth/change-password`.
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if req.new_password.len() < 8 {
        return Err(ApiError::bad_request(
            "new password must be at least 8 characters",
        ));
    }

    state
        .auth
        .change_password(user.user_id, &req.current_password, &req.new_password)
        .await?;
    Ok(Json(MessageResponse {
        message: "password changed".to_string(),
    }))
}
