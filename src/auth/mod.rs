//! Identity, credentials and bearer token claims.

mod credentials;
mod identity;
pub(crate) mod token;

pub use credentials::*;
pub use identity::*;
pub use token::{TokenClaims, TokenError, decode_claims, expiry_of};
