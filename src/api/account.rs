//! Account flows that do not start a session: registration and password recovery.

use tracing::{info, warn};

use crate::{
    api::{ApiError, AuthApi},
    auth::{PasswordReset, PasswordResetRequest, Registration},
};

/// Validate `registration` and create the account.
///
/// The user is not signed in; they continue at the login page.
///
/// # Errors
///
/// Returns an error when validation fails or the API refuses the registration.
pub async fn register(api: &dyn AuthApi, registration: &Registration) -> Result<(), ApiError> {
    registration.validate().map_err(ApiError::Credentials)?;

    api.register(registration).await?;

    info!("account registered");

    Ok(())
}

/// Ask for a reset link for `request.email`.
///
/// API and transport failures are logged and otherwise reported as success, so the
/// outcome never reveals whether an account exists.
///
/// # Errors
///
/// Returns an error only when the email fails validation.
pub async fn request_password_reset(
    api: &dyn AuthApi,
    request: &PasswordResetRequest,
) -> Result<(), ApiError> {
    request.validate().map_err(ApiError::Credentials)?;

    if let Err(source) = api.forgot_password(request).await {
        warn!("password reset request failed: {source}");
    }

    Ok(())
}

/// Validate `reset` and set the new password.
///
/// # Errors
///
/// Returns an error when validation fails, the reset token is rejected, or the request
/// fails.
pub async fn reset_password(api: &dyn AuthApi, reset: &PasswordReset) -> Result<(), ApiError> {
    reset.validate().map_err(ApiError::Credentials)?;

    api.reset_password(reset).await?;

    info!("password reset");

    Ok(())
}
