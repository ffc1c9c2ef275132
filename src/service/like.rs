use crate::{
    db::{BlogExt, LikeExt, UserExt},
    dtos::LikeDto,
    error::{ErrorMessage, ServiceError},
    models::{Identity, Like},
};

use super::{is_unique_violation, resolve_caller, store_error, validate_input};

const DEFAULT_LIKE: i32 = 1;

/// Like an article once. The pre-check gives the friendly error; the unique
/// index on `(article_id, user_id)` settles concurrent attempts.
pub async fn create_like<S: BlogExt + LikeExt + UserExt>(
    store: &S,
    identity: &Identity,
    article_id: i64,
    body: &LikeDto,
) -> Result<Like, ServiceError> {
    validate_input(body, "like")?;

    store
        .get_blog_by_id(article_id)
        .await
        .map_err(|e| store_error("getting blog", e))?
        .ok_or(ErrorMessage::BlogNotFound)?;

    let caller = resolve_caller(store, identity).await?;

    let existing = store
        .get_like_by_user(article_id, caller.id)
        .await
        .map_err(|e| store_error("checking like", e))?;
    if existing.is_some() {
        return Err(ErrorMessage::AlreadyLiked.into());
    }

    let like_count = body.like.unwrap_or(DEFAULT_LIKE);
    match store
        .save_like(article_id, caller.id, like_count, &caller.full_name)
        .await
    {
        Ok(like) => Ok(like),
        Err(e) if is_unique_violation(&e) => Err(ErrorMessage::AlreadyLiked.into()),
        Err(sqlx::Error::RowNotFound) => Err(ErrorMessage::BlogNotFound.into()),
        Err(e) => Err(store_error("saving like", e)),
    }
}

pub async fn delete_like<S: LikeExt + UserExt>(
    store: &S,
    identity: &Identity,
    article_id: i64,
    like_id: i64,
) -> Result<(), ServiceError> {
    let like = store
        .get_like(like_id)
        .await
        .map_err(|e| store_error("getting like", e))?
        .filter(|like| like.article_id == article_id)
        .ok_or(ErrorMessage::LikeNotFound)?;

    let caller = resolve_caller(store, identity).await?;
    if like.user_id != caller.id {
        return Err(ErrorMessage::ForbiddenDelete.into());
    }

    match store.delete_like(article_id, like.id).await {
        Ok(()) => Ok(()),
        Err(sqlx::Error::RowNotFound) => Err(ErrorMessage::LikeNotFound.into()),
        Err(e) => Err(store_error("deleting like", e)),
    }
}
