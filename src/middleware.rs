use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    error::{ErrorMessage, HttpError},
    models::{Identity, Role},
    utils::token,
};

/// Request extension carrying the verified caller
///
/// Inserted by `auth`; handlers take it with
/// `Extension(auth): Extension<JWTAuthMiddleware>`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JWTAuthMiddleware {
    pub identity: Identity,
}

/// Authentication gate.
///
/// Verifies the `Authorization: Bearer <token>` header and attaches the
/// identity from its claims. Any verification failure ends the request with
/// 401 and the verification message. No store lookup happens here.
pub async fn auth(
    State(config): State<Arc<Config>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, HttpError> {
    let raw_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let identity = token::decode_token(raw_header, config.jwt_secret.as_bytes()).map_err(|e| {
        tracing::warn!("Rejected bearer token: {}", e);
        HttpError::unauthorized(e.to_string())
    })?;

    req.extensions_mut().insert(JWTAuthMiddleware { identity });

    Ok(next.run(req).await)
}

/// Role gate; must be layered inside `auth`.
///
/// Without an identity from `auth` the request fails with 500 rather than
/// passing through. A role outside `required_roles` gets 403.
pub async fn role_check(
    req: Request,
    next: Next,
    required_roles: Vec<Role>,
) -> Result<impl IntoResponse, HttpError> {
    let auth = req.extensions().get::<JWTAuthMiddleware>().ok_or_else(|| {
        tracing::error!("Role check reached without an authenticated identity");
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    if !required_roles.contains(&auth.identity.role) {
        return Err(HttpError::forbidden(ErrorMessage::ForbiddenAccess.to_string()));
    }

    Ok(next.run(req).await)
}
