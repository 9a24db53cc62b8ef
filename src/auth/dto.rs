use serde::{Deserialize, Serialize};

use crate::auth::repo_types::Session;
use crate::auth::services::AuthPhase;

/// Request body for signup.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub display_name: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    /// Optional repeat of the new password, checked when present.
    #[serde(default)]
    pub confirm_password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeUsernameRequest {
    pub username: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeDisplayNameRequest {
    pub display_name: String,
}

/// Current auth state as the UI sees it.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub phase: AuthPhase,
    pub user: Option<Session>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CooldownResponse {
    pub can_change: bool,
    pub remaining_days: i64,
}
