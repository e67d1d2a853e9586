//! Session errors.

use jiff::Timestamp;
use thiserror::Error;
use tokio::runtime::TryCurrentError;

use crate::storage::StorageError;

/// Failure to create or change a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session could not be persisted.
    #[error("session storage error")]
    Storage(#[from] StorageError),

    /// No Tokio runtime to run the expiry countdown on.
    #[error("session manager must be created inside a Tokio runtime")]
    NoRuntime(#[source] TryCurrentError),

    /// Sign-in with an identity that holds no roles.
    #[error("identity has no roles")]
    EmptyRoles,

    /// The token has no usable `exp` and the policy discards such tokens.
    #[error("token has no usable expiry")]
    MissingExpiry,

    /// The token expired before sign-in.
    #[error("token expired at {expired_at}")]
    TokenExpired {
        /// Expiry carried by the token.
        expired_at: Timestamp,
    },
}
