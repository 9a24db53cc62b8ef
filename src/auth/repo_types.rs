use serde::{Deserialize, Serialize};

pub const CREDENTIALS_KEY: &str = "marvel_credentials";
pub const SESSION_KEY: &str = "marvel_user";
pub const LAST_USERNAME_CHANGE_KEY: &str = "last_username_change";

/// The single registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    pub email: String,            // normalized, lower-case
    pub password_hash: String,    // Argon2 PHC string
    pub username: String,
    pub display_name: String,
}

/// The signed-in identity, denormalized from the credential record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub email: String,
    pub username: String,
    pub display_name: String,
}
