//! Account form payloads and their client-side checks.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

const MIN_PASSWORD_CHARS: usize = 6;

#[expect(
    clippy::expect_used,
    reason = "the pattern is a literal and covered by tests"
)]
static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern should compile"));

/// Email/password pair posted to the login endpoint.
#[derive(Clone, Serialize)]
pub struct LoginCredentials {
    /// Account email.
    pub email: String,

    /// Plain-text password.
    pub password: String,
}

impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"**redacted**")
            .finish()
    }
}

/// A failed form check, displayed as the message shown next to the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CredentialsError {
    /// Registration without a username.
    #[error("username is required")]
    UsernameRequired,

    /// Empty email field.
    #[error("Email is required")]
    EmailRequired,

    /// Email without a `user@domain.tld` shape.
    #[error("Please enter a valid email")]
    EmailInvalid,

    /// Empty password field.
    #[error("Password is required")]
    PasswordRequired,

    /// Password shorter than six characters.
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,

    /// Reset attempted without the emailed reset token.
    #[error("Cannot proceed: Token is missing.")]
    ResetTokenMissing,

    /// New password and its confirmation differ.
    #[error("New password and confirmation do not match.")]
    PasswordMismatch,

    /// New password shorter than six characters.
    #[error("New password must be at least 6 characters long.")]
    NewPasswordTooShort,
}

fn check_email(email: &str, errors: &mut Vec<CredentialsError>) {
    if email.is_empty() {
        errors.push(CredentialsError::EmailRequired);
    } else if !EMAIL_PATTERN.is_match(email) {
        errors.push(CredentialsError::EmailInvalid);
    }
}

fn check_password(password: &str, errors: &mut Vec<CredentialsError>) {
    if password.is_empty() {
        errors.push(CredentialsError::PasswordRequired);
    } else if password.chars().count() < MIN_PASSWORD_CHARS {
        errors.push(CredentialsError::PasswordTooShort);
    }
}

fn into_result(errors: Vec<CredentialsError>) -> Result<(), Vec<CredentialsError>> {
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

impl LoginCredentials {
    /// Credentials from the form fields.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Check the form before it is submitted.
    ///
    /// # Errors
    ///
    /// Returns every failing field check, email first.
    pub fn validate(&self) -> Result<(), Vec<CredentialsError>> {
        let mut errors = Vec::new();

        check_email(&self.email, &mut errors);
        check_password(&self.password, &mut errors);

        into_result(errors)
    }
}

/// New account posted to the register endpoint.
#[derive(Clone, Serialize)]
pub struct Registration {
    /// Display name.
    pub username: String,

    /// Account email.
    pub email: String,

    /// Plain-text password.
    pub password: String,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"**redacted**")
            .finish()
    }
}

impl Registration {
    /// Registration from the form fields.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    /// Check the form before it is submitted.
    ///
    /// # Errors
    ///
    /// Returns every failing field check in form order.
    pub fn validate(&self) -> Result<(), Vec<CredentialsError>> {
        let mut errors = Vec::new();

        if self.username.is_empty() {
            errors.push(CredentialsError::UsernameRequired);
        }

        check_email(&self.email, &mut errors);
        check_password(&self.password, &mut errors);

        into_result(errors)
    }
}

/// Request for a password reset link.
#[derive(Debug, Clone, Serialize)]
pub struct PasswordResetRequest {
    /// Email the link is sent to.
    pub email: String,
}

impl PasswordResetRequest {
    /// Request a link for `email`.
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }

    /// Check the email before it is submitted.
    ///
    /// # Errors
    ///
    /// Returns the failing email check.
    pub fn validate(&self) -> Result<(), Vec<CredentialsError>> {
        let mut errors = Vec::new();

        check_email(&self.email, &mut errors);

        into_result(errors)
    }
}

/// New password set with the token from a reset link.
///
/// Only the token and new password are sent; the confirmation stays on this side.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordReset {
    /// Token from the reset link.
    pub token: String,

    /// Password to set.
    pub new_password: String,

    /// Repeat of `new_password`, checked locally.
    #[serde(skip)]
    pub confirm_password: String,
}

impl std::fmt::Debug for PasswordReset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordReset")
            .field("token", &"**redacted**")
            .field("new_password", &"**redacted**")
            .field("confirm_password", &"**redacted**")
            .finish()
    }
}

impl PasswordReset {
    /// Reset from the link token and the form fields.
    #[must_use]
    pub fn new(
        token: impl Into<String>,
        new_password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            new_password: new_password.into(),
            confirm_password: confirm_password.into(),
        }
    }

    /// Check the form before it is submitted.
    ///
    /// # Errors
    ///
    /// Returns every failing check: missing token, mismatched confirmation, short password.
    pub fn validate(&self) -> Result<(), Vec<CredentialsError>> {
        let mut errors = Vec::new();

        if self.token.is_empty() {
            errors.push(CredentialsError::ResetTokenMissing);
        }

        if self.new_password != self.confirm_password {
            errors.push(CredentialsError::PasswordMismatch);
        }

        if self.new_password.chars().count() < MIN_PASSWORD_CHARS {
            errors.push(CredentialsError::NewPasswordTooShort);
        }

        into_result(errors)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn accepts_well_formed_credentials() {
        assert_eq!(
            LoginCredentials::new("kisan@example.com", "secret1").validate(),
            Ok(())
        );
    }

    #[test]
    fn reports_each_field() {
        assert_eq!(
            LoginCredentials::new("", "").validate(),
            Err(vec![
                CredentialsError::EmailRequired,
                CredentialsError::PasswordRequired
            ])
        );

        assert_eq!(
            LoginCredentials::new("kisan@example", "12345").validate(),
            Err(vec![
                CredentialsError::EmailInvalid,
                CredentialsError::PasswordTooShort
            ])
        );
    }

    #[test]
    fn debug_output_redacts_password() {
        let rendered = format!("{:?}", LoginCredentials::new("a@b.co", "hunter22"));

        assert!(!rendered.contains("hunter22"), "password leaked: {rendered}");
    }

    #[test]
    fn registration_requires_every_field() {
        assert_eq!(
            Registration::new("", "ramesh@example", "12345").validate(),
            Err(vec![
                CredentialsError::UsernameRequired,
                CredentialsError::EmailInvalid,
                CredentialsError::PasswordTooShort
            ])
        );

        assert_eq!(
            Registration::new("Ramesh", "ramesh@example.com", "secret1").validate(),
            Ok(())
        );
    }

    #[test]
    fn reset_link_request_needs_an_email() {
        assert_eq!(
            PasswordResetRequest::new("").validate(),
            Err(vec![CredentialsError::EmailRequired])
        );
        assert_eq!(PasswordResetRequest::new("ramesh@example.com").validate(), Ok(()));
    }

    #[test]
    fn reset_checks_token_and_confirmation() {
        assert_eq!(
            PasswordReset::new("", "abc", "abd").validate(),
            Err(vec![
                CredentialsError::ResetTokenMissing,
                CredentialsError::PasswordMismatch,
                CredentialsError::NewPasswordTooShort
            ])
        );

        assert_eq!(
            PasswordReset::new("r-123", "newsecret", "newsecret").validate(),
            Ok(())
        );
    }

    #[test]
    fn reset_body_omits_the_confirmation() -> TestResult {
        let body = serde_json::to_value(PasswordReset::new("r-123", "newsecret", "newsecret"))?;

        assert_eq!(
            body,
            serde_json::json!({ "token": "r-123", "newPassword": "newsecret" })
        );

        Ok(())
    }
}
