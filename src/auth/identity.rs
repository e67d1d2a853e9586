//! Authenticated principal.

use serde::{Deserialize, Serialize};

/// The signed-in user as persisted alongside the bearer token.
///
/// Serialized with the field names the storefront keeps in local storage
/// (`id`, `name`, `email`, `role`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Unique user id.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Email address.
    pub email: String,

    /// Role labels, in the order the API returned them.
    #[serde(rename = "role")]
    pub roles: Vec<String>,
}

impl Identity {
    /// An identity holding `roles`.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        roles: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            roles,
        }
    }

    /// Case-sensitive role membership.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|held| held == role)
    }
}
