//! Business rules for every resource.
//!
//! Services are free functions generic over the store traits in `db`, the
//! state cache in `redisdb` and the identity provider in `http`. They take
//! plain DTOs and the caller's `Identity` and never see HTTP types; the
//! boundary turns their `ServiceError` into a response.

use validator::Validate;

use crate::{
    db::UserExt,
    error::{ErrorMessage, ServiceError},
    models::{Identity, User},
};

pub mod auth;
pub mod blog;
pub mod comment;
pub mod like;
pub mod tag;
pub mod user;

#[cfg(test)]
pub(crate) mod fakes;

fn validate_input<T: Validate>(input: &T, context: &str) -> Result<(), ServiceError> {
    input.validate().map_err(|e| {
        tracing::error!("Invalid {} input: {}", context, e);
        ServiceError::Rejected(ErrorMessage::InvalidRequest)
    })
}

fn store_error(context: &str, e: sqlx::Error) -> ServiceError {
    tracing::error!("DB error, {}: {}", context, e);
    ServiceError::Store(e)
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// Load the account behind the token.
///
/// Tokens carry no user id, so ownership checks go through the email. A token
/// that outlived its account is rejected as `UserNoLongerExist`.
async fn resolve_caller<S: UserExt>(store: &S, identity: &Identity) -> Result<User, ServiceError> {
    store
        .get_user_by_email(&identity.email)
        .await
        .map_err(|e| store_error("resolving caller", e))?
        .ok_or(ServiceError::Rejected(ErrorMessage::UserNoLongerExist))
}
