//! Role checks and outbound request authorization.

use mockall::automock;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, InvalidHeaderValue};
use thiserror::Error;

use crate::session::SessionManager;

/// Failure to decorate a request.
#[derive(Debug, Error)]
pub enum GateError {
    /// The token contains bytes not allowed in a header value.
    #[error("session token cannot be sent as a header value")]
    InvalidToken(#[source] InvalidHeaderValue),
}

/// Read-only questions about the current session.
#[automock]
pub trait AuthorizationGate: Send + Sync {
    /// True iff someone is signed in and holds `role` (exact, case-sensitive match).
    fn has_role(&self, role: &str) -> bool;

    /// A copy of `base` carrying `Authorization: Bearer <token>` when signed in.
    ///
    /// `base` itself is never modified. Without a session the copy is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the token contains bytes not allowed in a header value.
    fn authorization_headers(&self, base: &HeaderMap) -> Result<HeaderMap, GateError>;
}

impl AuthorizationGate for SessionManager {
    fn has_role(&self, role: &str) -> bool {
        self.holds_role(role)
    }

    fn authorization_headers(&self, base: &HeaderMap) -> Result<HeaderMap, GateError> {
        let mut headers = base.clone();

        if let Some(token) = self.token() {
            headers.insert(AUTHORIZATION, bearer(&token)?);
        }

        Ok(headers)
    }
}

fn bearer(token: &str) -> Result<HeaderValue, GateError> {
    let mut value =
        HeaderValue::from_str(&format!("Bearer {token}")).map_err(GateError::InvalidToken)?;

    value.set_sensitive(true);

    Ok(value)
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn bearer_values_are_sensitive() -> TestResult {
        let value = bearer("abc")?;

        assert_eq!(value.to_str()?, "Bearer abc");
        assert!(value.is_sensitive());

        Ok(())
    }

    #[test]
    fn control_characters_are_rejected() {
        assert!(matches!(bearer("abc\ndef"), Err(GateError::InvalidToken(_))));
    }
}
