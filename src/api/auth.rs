use axum::{Json, extract::Request, extract::State, middleware::Next, response::Response};
use std::sync::Arc;
use time::OffsetDateTime;
use tower_sessions::{Expiry, Session};

use super::types::{
    AuthStatusBody, ChangePasswordRequest, Empty, LoginBody, LoginRequest, SessionUser,
};
use super::extract::ApiJson;
use super::observability::RequestUser;
use super::validation::{validate_login, validate_password_change};
use super::{ApiError, ApiResponse, AppState};
use crate::constants::session::ADMIN_KEY;

// ============================================================================
// Middleware
// ============================================================================

/// Rejects requests without an authenticated session.
pub async fn auth_middleware(
    session: Session,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = session_user(&session).await?;

    let mut response = next.run(request).await;
    response.extensions_mut().insert(RequestUser(user.username));
    Ok(response)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<ApiResponse<LoginBody>>, ApiError> {
    validate_login(&payload.username, &payload.password)?;

    let user = state
        .auth_service()
        .login(payload.username.trim(), &payload.password)
        .await?;
    let user = SessionUser::from(user);

    session
        .cycle_id()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;
    session
        .insert(ADMIN_KEY, &user)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    let ttl = time::Duration::hours(state.config().server.session_ttl_hours);
    session.set_expiry(Some(Expiry::AtDateTime(OffsetDateTime::now_utc() + ttl)));

    tracing::info!(username = %user.username, "Admin logged in");

    Ok(Json(
        ApiResponse::success(LoginBody { user }).with_message("Logged in successfully"),
    ))
}

/// POST /api/logout
pub async fn logout(session: Session) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    session
        .flush()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to log out: {e}")))?;

    Ok(Json(ApiResponse::message("Logged out successfully")))
}

/// GET /api/auth-status
pub async fn auth_status(session: Session) -> Json<ApiResponse<AuthStatusBody>> {
    let user = session.get::<SessionUser>(ADMIN_KEY).await.ok().flatten();

    Json(ApiResponse::success(AuthStatusBody {
        authenticated: user.is_some(),
        user,
    }))
}

/// POST /api/change-password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    let user = session_user(&session).await?;

    validate_password_change(&payload, state.config().security.min_password_length)?;

    state
        .auth_service()
        .change_password(&user.username, &payload.old_password, &payload.new_password)
        .await?;

    Ok(Json(ApiResponse::message("Password changed successfully")))
}

// ============================================================================
// Helpers
// ============================================================================

/// Session identity, or 401 when there is none.
async fn session_user(session: &Session) -> Result<SessionUser, ApiError> {
    session
        .get::<SessionUser>(ADMIN_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
        .ok_or_else(ApiError::unauthorized)
}
