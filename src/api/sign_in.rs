//! Password sign-in flow.

use tracing::info;

use crate::{
    api::{ApiError, AuthApi},
    auth::LoginCredentials,
    session::SessionManager,
};

/// Validate `credentials`, authenticate against `api`, and start the session.
///
/// Returns the landing path for the signed-in user.
///
/// # Errors
///
/// Returns an error when validation fails, the API rejects the credentials or is
/// unreachable, or the session cannot be established.
pub async fn sign_in(
    api: &dyn AuthApi,
    manager: &SessionManager,
    credentials: &LoginCredentials,
) -> Result<String, ApiError> {
    credentials.validate().map_err(ApiError::Credentials)?;

    let response = api.login(credentials).await?;
    let identity = response.identity();

    manager.login(identity, response.access_token)?;

    info!("signed in");

    Ok(manager.landing_path())
}
