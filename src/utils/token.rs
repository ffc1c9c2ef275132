use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, decode_header, encode,
    errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::ErrorMessage,
    models::{Identity, Role},
};

/// Only the HMAC family is ever accepted. A token whose header names any
/// other algorithm is rejected before the signature is looked at.
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub full_name: String,
    pub email: String,
    pub role_name: String,
    pub exp: i64,
}

/// Sign an access token for `identity`, valid for `expires_in_seconds`.
///
/// Returns the token together with its absolute expiry so login responses can
/// report `expires_at` without decoding what they just signed.
pub fn create_token(
    identity: &Identity,
    secret: &[u8],
    expires_in_seconds: i64,
) -> Result<(String, DateTime<Utc>), ErrorMessage> {
    if secret.is_empty() {
        return Err(ErrorMessage::SigningError);
    }

    let expires_at = Utc::now() + Duration::seconds(expires_in_seconds);
    let claims = TokenClaims {
        full_name: identity.full_name.clone(),
        email: identity.email.clone(),
        role_name: identity.role.to_str().to_string(),
        exp: expires_at.timestamp(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| {
        tracing::error!("Token signing failed: {}", e);
        ErrorMessage::SigningError
    })?;

    Ok((token, expires_at))
}

/// Verify the raw `Authorization` header value and return the identity in it.
///
/// The identity comes from the claims verbatim; nothing is re-read from the
/// store here.
pub fn decode_token(raw_header: Option<&str>, secret: &[u8]) -> Result<Identity, ErrorMessage> {
    let raw_header = raw_header
        .filter(|value| !value.trim().is_empty())
        .ok_or(ErrorMessage::TokenNotProvided)?;

    let token = raw_header
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(ErrorMessage::InvalidToken)?;

    let header = decode_header(token).map_err(|_| ErrorMessage::InvalidToken)?;
    if !ACCEPTED_ALGORITHMS.contains(&header.alg) {
        tracing::warn!("Rejected token signed with {:?}", header.alg);
        return Err(ErrorMessage::InvalidToken);
    }

    let mut validation = Validation::new(header.alg);
    validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp"]);

    let data = decode::<TokenClaims>(token, &DecodingKey::from_secret(secret), &validation)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => ErrorMessage::TokenExpired,
            ErrorKind::Json(_) => ErrorMessage::TypeAssertion,
            _ => ErrorMessage::InvalidToken,
        })?;

    let role = data
        .claims
        .role_name
        .parse::<Role>()
        .map_err(|_| ErrorMessage::TypeAssertion)?;

    Ok(Identity {
        full_name: data.claims.full_name,
        email: data.claims.email,
        role,
    })
}
