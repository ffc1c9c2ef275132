use crate::{
    db::{USER_SORTABLE, UserExt},
    dtos::{ListQueryDto, Metadata, UpdateUserDto},
    error::{ErrorMessage, ServiceError},
    models::{Identity, Role, User},
    utils::{
        pagination::{ListParams, paginate},
        password,
    },
};

use super::{is_unique_violation, resolve_caller, store_error, validate_input};

/// Admin listing; only Author accounts are listed.
pub async fn list_users<S: UserExt>(
    store: &S,
    query: &ListQueryDto,
) -> Result<(Vec<User>, Metadata), ServiceError> {
    validate_input(query, "user list")?;
    let params = ListParams::from_query(query, USER_SORTABLE)?;

    let (rows, total) = store
        .get_users(&params, Role::Author)
        .await
        .map_err(|e| store_error("getting users", e))?;

    Ok(paginate(rows, total, &params))
}

pub async fn get_user<S: UserExt>(store: &S, user_id: i64) -> Result<User, ServiceError> {
    store
        .get_user_by_id(user_id)
        .await
        .map_err(|e| store_error("getting user", e))?
        .ok_or(ServiceError::Rejected(ErrorMessage::UserNotFound))
}

/// A user may edit their own profile; a Superadmin may edit anyone's.
pub async fn update_user<S: UserExt>(
    store: &S,
    identity: &Identity,
    user_id: i64,
    body: &UpdateUserDto,
) -> Result<User, ServiceError> {
    validate_input(body, "user update")?;

    let target = get_user(store, user_id).await?;
    let caller = resolve_caller(store, identity).await?;
    if caller.role != Role::Superadmin && caller.id != target.id {
        return Err(ErrorMessage::ForbiddenUpdate.into());
    }

    let taken = store
        .email_taken(&body.email, target.id)
        .await
        .map_err(|e| store_error("checking email", e))?;
    if taken {
        return Err(ErrorMessage::EmailExisted.into());
    }

    let hashed_password = match body.password.as_deref() {
        Some(new_password) => Some(password::hash(new_password)?),
        None => None,
    };

    match store
        .update_user(
            target.id,
            &body.full_name,
            &body.email,
            hashed_password.as_deref(),
            &caller.full_name,
        )
        .await
    {
        Ok(user) => Ok(user),
        Err(e) if is_unique_violation(&e) => Err(ErrorMessage::EmailExisted.into()),
        Err(e) => Err(store_error("updating user", e)),
    }
}

/// Admin-only removal; an account can never delete itself.
pub async fn delete_user<S: UserExt>(
    store: &S,
    identity: &Identity,
    user_id: i64,
) -> Result<(), ServiceError> {
    let caller = resolve_caller(store, identity).await?;
    if caller.id == user_id {
        return Err(ErrorMessage::ForbiddenDeleteSelf.into());
    }

    get_user(store, user_id).await?;

    match store.delete_user(user_id).await {
        Ok(()) => Ok(()),
        Err(sqlx::Error::RowNotFound) => Err(ErrorMessage::UserNotFound.into()),
        Err(e) => Err(store_error("deleting user", e)),
    }
}
