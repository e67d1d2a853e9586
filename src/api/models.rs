//! API payloads.

use serde::Deserialize;

use crate::auth::Identity;

/// Body returned by `POST /auth/login`.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Backend user id.
    pub user_id: String,

    /// Display name.
    pub username: String,

    /// Email address.
    pub email: String,

    /// Role labels.
    pub roles: Vec<String>,

    /// Bearer token. Sent in snake case, unlike the other fields.
    #[serde(rename = "access_token")]
    pub access_token: String,
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("roles", &self.roles)
            .field("access_token", &"**redacted**")
            .finish()
    }
}

impl LoginResponse {
    /// The signed-in identity described by this response.
    pub fn identity(&self) -> Identity {
        Identity::new(
            self.user_id.clone(),
            self.username.clone(),
            self.email.clone(),
            self.roles.clone(),
        )
    }
}
