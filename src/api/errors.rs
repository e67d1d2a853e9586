//! API errors.

use reqwest::StatusCode;
use thiserror::Error;

use crate::{auth::CredentialsError, gate::GateError, session::SessionError};

/// Failure of a storefront API flow.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The form failed its client-side checks; nothing was sent.
    #[error("credentials failed validation")]
    Credentials(Vec<CredentialsError>),

    /// The request could not be sent or the response not read.
    #[error("request failed")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API responded with status {status}")]
    Rejected {
        /// Status the API answered with.
        status: StatusCode,
    },

    /// The API refused a password reset token.
    #[error("Invalid or expired reset token. Please request a new link.")]
    InvalidResetToken,

    /// The session token could not be attached.
    #[error("failed to authorize request")]
    Gate(#[from] GateError),

    /// The session could not be started after a successful sign-in.
    #[error("failed to establish session")]
    Session(#[from] SessionError),
}
