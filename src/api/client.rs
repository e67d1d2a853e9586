//! HTTP client for the storefront API.

use async_trait::async_trait;
use mockall::automock;
use reqwest::{Client, Response, StatusCode, header::HeaderMap};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    api::{ApiError, LoginResponse},
    auth::{LoginCredentials, PasswordReset, PasswordResetRequest, Registration},
    gate::AuthorizationGate,
};

/// Remote authentication.
#[automock]
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange credentials for an identity and bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails or the API rejects the credentials.
    async fn login(&self, credentials: &LoginCredentials) -> Result<LoginResponse, ApiError>;

    /// Create an account. The new user still has to sign in.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails or the API refuses the registration.
    async fn register(&self, registration: &Registration) -> Result<(), ApiError>;

    /// Ask for a password reset link to be emailed.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails or the API responds with a failure status.
    async fn forgot_password(&self, request: &PasswordResetRequest) -> Result<(), ApiError>;

    /// Set a new password using the token from a reset link.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidResetToken`] when the API rejects the token, or another
    /// error when the request fails.
    async fn reset_password(&self, reset: &PasswordReset) -> Result<(), ApiError>;
}

/// `reqwest` client rooted at the API base URL.
#[derive(Debug, Clone)]
pub struct ReqwestAuthApi {
    base_url: String,
    http: Client,
}

impl ReqwestAuthApi {
    /// Client for the API rooted at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Use a preconfigured `http` client, for example one with proxies disabled.
    #[must_use]
    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        Self {
            base_url: base_url.into(),
            http,
        }
    }

    /// Absolute URL for `path` under the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// `GET` `path` with the session's authorization header.
    ///
    /// # Errors
    ///
    /// Returns an error if the headers cannot be built, the request fails, or the API
    /// responds with a non-success status.
    pub async fn authorized_get(
        &self,
        gate: &dyn AuthorizationGate,
        path: &str,
    ) -> Result<Response, ApiError> {
        let headers = gate.authorization_headers(&HeaderMap::new())?;
        let url = self.endpoint(path);

        debug!(%url, authorized = !headers.is_empty(), "sending request");

        let response = self.http.get(&url).headers(headers).send().await?;

        if !response.status().is_success() {
            return Err(ApiError::Rejected {
                status: response.status(),
            });
        }

        Ok(response)
    }

    async fn post<B>(&self, path: &str, body: &B) -> Result<Response, ApiError>
    where
        B: Serialize + Sync + ?Sized,
    {
        let response = self.http.post(self.endpoint(path)).json(body).send().await?;
        let status = response.status();

        if !status.is_success() {
            warn!(%status, path, "request rejected");

            return Err(ApiError::Rejected { status });
        }

        Ok(response)
    }
}

#[async_trait]
impl AuthApi for ReqwestAuthApi {
    async fn login(&self, credentials: &LoginCredentials) -> Result<LoginResponse, ApiError> {
        let response = self.post("auth/login", credentials).await?;

        Ok(response.json().await?)
    }

    async fn register(&self, registration: &Registration) -> Result<(), ApiError> {
        self.post("auth/register", registration).await?;

        Ok(())
    }

    async fn forgot_password(&self, request: &PasswordResetRequest) -> Result<(), ApiError> {
        self.post("auth/forgot-password", request).await?;

        Ok(())
    }

    async fn reset_password(&self, reset: &PasswordReset) -> Result<(), ApiError> {
        match self.post("auth/reset-password", reset).await {
            Ok(_) => Ok(()),
            Err(ApiError::Rejected { status }) if status == StatusCode::BAD_REQUEST => {
                Err(ApiError::InvalidResetToken)
            }
            Err(error) => Err(error),
        }
    }
}
