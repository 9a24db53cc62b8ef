use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{error, instrument};

use crate::{
    auth::{
        dto::{
            ChangeDisplayNameRequest, ChangePasswordRequest, ChangeUsernameRequest,
            CooldownResponse, LoginRequest, RegisterRequest, SessionResponse,
        },
        repo_types::Session,
        services::{AuthError, SessionStore},
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/session", get(current_session))
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/me/password", put(change_password))
        .route("/me/username", put(change_username))
        .route("/me/display-name", put(change_display_name))
        .route("/me/username-cooldown", get(username_cooldown))
}

pub(crate) fn status_for(err: &AuthError) -> StatusCode {
    match err {
        AuthError::Validation(_) => StatusCode::BAD_REQUEST,
        AuthError::DuplicateEmail => StatusCode::CONFLICT,
        AuthError::UnknownEmail | AuthError::InvalidPassword | AuthError::NotAuthenticated => {
            StatusCode::UNAUTHORIZED
        }
        AuthError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        AuthError::Storage(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(err: AuthError) -> (StatusCode, String) {
    let status = status_for(&err);
    if status.is_server_error() {
        error!(error = %err, "auth operation failed");
    }
    (status, err.to_string())
}

#[instrument(skip(sessions, payload))]
pub async fn register(
    State(sessions): State<Arc<SessionStore>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<Session>, (StatusCode, String)> {
    sessions
        .register(
            &payload.email,
            &payload.username,
            &payload.password,
            &payload.display_name,
        )
        .await
        .map(Json)
        .map_err(reject)
}

#[instrument(skip(sessions, payload))]
pub async fn login(
    State(sessions): State<Arc<SessionStore>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<Session>, (StatusCode, String)> {
    sessions
        .authenticate(&payload.email, &payload.password)
        .await
        .map(Json)
        .map_err(reject)
}

#[instrument(skip(sessions))]
pub async fn logout(State(sessions): State<Arc<SessionStore>>) -> StatusCode {
    sessions.end_session();
    StatusCode::NO_CONTENT
}

#[instrument(skip(sessions))]
pub async fn current_session(State(sessions): State<Arc<SessionStore>>) -> Json<SessionResponse> {
    Json(SessionResponse {
        phase: sessions.phase(),
        user: sessions.current_session(),
    })
}

#[instrument(skip(sessions, payload))]
pub async fn change_password(
    State(sessions): State<Arc<SessionStore>>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    if let Some(confirm) = &payload.confirm_password {
        if *confirm != payload.new_password {
            return Err((
                StatusCode::BAD_REQUEST,
                "New passwords do not match.".into(),
            ));
        }
    }
    sessions
        .change_password(&payload.current_password, &payload.new_password)
        .await
        .map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(sessions, payload))]
pub async fn change_username(
    State(sessions): State<Arc<SessionStore>>,
    Json(payload): Json<ChangeUsernameRequest>,
) -> Result<Json<Session>, (StatusCode, String)> {
    sessions
        .change_username(&payload.username)
        .await
        .map(Json)
        .map_err(reject)
}

#[instrument(skip(sessions, payload))]
pub async fn change_display_name(
    State(sessions): State<Arc<SessionStore>>,
    Json(payload): Json<ChangeDisplayNameRequest>,
) -> Result<Json<Session>, (StatusCode, String)> {
    sessions
        .change_display_name(&payload.display_name)
        .await
        .map(Json)
        .map_err(reject)
}

#[instrument(skip(sessions))]
pub async fn username_cooldown(
    State(sessions): State<Arc<SessionStore>>,
) -> Json<CooldownResponse> {
    let remaining_days = sessions.days_until_username_change();
    Json(CooldownResponse {
        can_change: remaining_days == 0,
        remaining_days,
    })
}
