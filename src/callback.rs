//! Completing the Google OAuth redirect.
//!
//! The backend finishes the OAuth dance and redirects to the storefront's callback page
//! with `token`, `username`, `email` and a comma-separated `roles` list in the query.

use reqwest::Url;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    auth::{Identity, decode_claims},
    session::{SessionError, SessionManager},
};

/// Failure to complete an OAuth callback.
#[derive(Debug, Error)]
pub enum CallbackError {
    /// A required query parameter is absent or empty.
    #[error("callback is missing the `{0}` parameter")]
    MissingParameter(&'static str),

    /// The session could not be started.
    #[error("failed to establish session")]
    Session(#[from] SessionError),
}

#[derive(Debug, Default)]
struct CallbackParams {
    token: Option<String>,
    username: Option<String>,
    email: Option<String>,
    roles: Option<String>,
}

impl CallbackParams {
    fn from_url(url: &Url) -> Self {
        let mut params = Self::default();

        for (name, value) in url.query_pairs() {
            if value.is_empty() {
                continue;
            }

            let slot = match name.as_ref() {
                "token" => &mut params.token,
                "username" => &mut params.username,
                "email" => &mut params.email,
                "roles" => &mut params.roles,
                _ => continue,
            };

            *slot = Some(value.into_owned());
        }

        params
    }
}

/// Sign in from an OAuth callback URL and return the landing path.
///
/// The user id comes from the token's `sub` claim, falling back to the email when the
/// token cannot be decoded.
///
/// # Errors
///
/// Returns an error when a required parameter is missing or the session cannot be
/// established.
pub fn complete_oauth_callback(
    manager: &SessionManager,
    url: &Url,
) -> Result<String, CallbackError> {
    let params = CallbackParams::from_url(url);

    let token = params.token.ok_or(CallbackError::MissingParameter("token"))?;
    let username = params
        .username
        .ok_or(CallbackError::MissingParameter("username"))?;
    let email = params.email.ok_or(CallbackError::MissingParameter("email"))?;
    let roles = params.roles.ok_or(CallbackError::MissingParameter("roles"))?;

    let roles = roles
        .split(',')
        .map(str::trim)
        .filter(|role| !role.is_empty())
        .map(str::to_string)
        .collect();

    let user_id = match decode_claims(&token) {
        Ok(claims) => claims.sub.unwrap_or_else(|| email.clone()),
        Err(source) => {
            warn!("failed to decode callback token, using email as user id: {source}");

            email.clone()
        }
    };

    manager.login(Identity::new(user_id, username, email, roles), token)?;

    info!("oauth callback completed");

    Ok(manager.landing_path())
}
