//! Bearer token claims and expiry.

use base64::{
    Engine as _,
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, general_purpose},
};
use jiff::Timestamp;
use serde_json::{Map, Value};
use thiserror::Error;

/// Base64url engine that accepts claims segments with or without padding.
const CLAIMS_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    general_purpose::NO_PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Claims carried in the payload segment of a storefront bearer token.
///
/// Only `exp` drives the session lifecycle; `sub` is used to recover the user id when an
/// OAuth redirect does not carry one. Claims of an unexpected JSON type read as absent
/// and never affect the others.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenClaims {
    /// Subject (user id). Numeric subjects are rendered as text.
    pub sub: Option<String>,

    /// Email address of the subject.
    pub email: Option<String>,

    /// Display name of the subject.
    pub username: Option<String>,

    /// Role labels granted to the subject. A single string is read as one role.
    pub roles: Option<Vec<String>>,

    /// Issued-at, in seconds since the epoch.
    pub iat: Option<i64>,

    /// Expiry, in seconds since the epoch.
    pub exp: Option<i64>,
}

impl TokenClaims {
    fn from_object(claims: &Map<String, Value>) -> Self {
        let text = |name: &str| -> Option<String> {
            match claims.get(name)? {
                Value::String(value) => Some(value.clone()),
                Value::Number(value) => Some(value.to_string()),
                _ => None,
            }
        };
        let seconds = |name: &str| claims.get(name).and_then(Value::as_i64);

        let roles = match claims.get("roles") {
            Some(Value::Array(values)) => Some(
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
            ),
            Some(Value::String(role)) => Some(vec![role.clone()]),
            _ => None,
        };

        Self {
            sub: text("sub"),
            email: text("email"),
            username: text("username"),
            roles,
            iat: seconds("iat"),
            exp: seconds("exp"),
        }
    }
}

/// Failure to read the claims segment of a token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The token has fewer than two segments, or an empty payload.
    #[error("token has no claims segment")]
    MissingClaims,

    /// The payload is not base64url.
    #[error("token claims are not valid base64url")]
    Encoding(#[source] base64::DecodeError),

    /// The payload does not decode to a JSON object.
    #[error("token claims are not a JSON object")]
    Claims(#[source] serde_json::Error),
}

/// Decode the claims of `token` without verifying its signature.
///
/// # Errors
///
/// Returns an error if the token has no payload segment, the payload is not base64url, or
/// the decoded bytes are not a JSON object.
pub fn decode_claims(token: &str) -> Result<TokenClaims, TokenError> {
    let payload = token
        .split('.')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .ok_or(TokenError::MissingClaims)?;

    let bytes = CLAIMS_ENGINE
        .decode(payload)
        .map_err(TokenError::Encoding)?;

    let claims: Map<String, Value> = serde_json::from_slice(&bytes).map_err(TokenError::Claims)?;

    Ok(TokenClaims::from_object(&claims))
}

/// Absolute expiry of `token`, if it carries a usable one.
///
/// Any decode failure, a missing or non-integer `exp` claim, or `exp == 0` yields `None`.
/// Other claims are not consulted.
pub fn expiry_of(token: &str) -> Option<Timestamp> {
    let claims = decode_claims(token).ok()?;
    let seconds = claims.exp.filter(|exp| *exp != 0)?;

    Timestamp::from_second(seconds).ok()
}
