//! Session behaviour settings.

/// What to do with a token whose expiry cannot be decoded.
///
/// Applied the same way on sign-in and on restore.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingExpiryPolicy {
    /// Refuse it on sign-in and drop it from storage on restore.
    #[default]
    Discard,

    /// Keep the session until an explicit logout.
    NonExpiring,
}

/// Settings for a [`SessionManager`](crate::session::SessionManager).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Handling of tokens without a usable `exp` claim.
    pub missing_expiry: MissingExpiryPolicy,

    /// Storefront root; logout redirects here.
    pub home_path: String,

    /// Login page; logout never redirects away from it.
    pub login_path: String,

    /// Admin dashboard, the landing path for admins.
    pub admin_path: String,

    /// Role that lands on the admin dashboard after sign-in.
    pub admin_role: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            missing_expiry: MissingExpiryPolicy::default(),
            home_path: "/".to_string(),
            login_path: "/auth/login".to_string(),
            admin_path: "/admin".to_string(),
            admin_role: "admin".to_string(),
        }
    }
}

impl SessionConfig {
    /// Where a user with `roles` is sent after signing in.
    pub fn landing_path(&self, roles: &[String]) -> &str {
        if roles.iter().any(|role| *role == self.admin_role) {
            &self.admin_path
        } else {
            &self.home_path
        }
    }

    /// Whether logout from `path` should redirect to the home path.
    pub(crate) fn redirects_from(&self, path: &str) -> bool {
        path != self.home_path && path != self.login_path
    }
}
