use crate::{
    db::{TAG_SORTABLE, TagExt},
    dtos::{ListQueryDto, Metadata, TagDto},
    error::{ErrorMessage, ServiceError},
    models::{Identity, Tag},
    utils::pagination::{ListParams, paginate},
};

use super::{is_unique_violation, store_error, validate_input};

pub async fn list_tags<S: TagExt>(
    store: &S,
    query: &ListQueryDto,
) -> Result<(Vec<Tag>, Metadata), ServiceError> {
    validate_input(query, "tag list")?;
    let params = ListParams::from_query(query, TAG_SORTABLE)?;

    let (rows, total) = store
        .get_tags(&params)
        .await
        .map_err(|e| store_error("getting tags", e))?;

    Ok(paginate(rows, total, &params))
}

pub async fn create_tag<S: TagExt>(
    store: &S,
    identity: &Identity,
    body: &TagDto,
) -> Result<Tag, ServiceError> {
    validate_input(body, "tag")?;

    let exists = store
        .tag_name_exists(&body.name, None)
        .await
        .map_err(|e| store_error("checking tag name", e))?;
    if exists {
        return Err(ErrorMessage::TagNameExisted.into());
    }

    match store.save_tag(&body.name, &identity.full_name).await {
        Ok(tag) => Ok(tag),
        Err(e) if is_unique_violation(&e) => Err(ErrorMessage::TagNameExisted.into()),
        Err(e) => Err(store_error("saving tag", e)),
    }
}

pub async fn update_tag<S: TagExt>(
    store: &S,
    identity: &Identity,
    tag_id: i64,
    body: &TagDto,
) -> Result<Tag, ServiceError> {
    validate_input(body, "tag")?;

    store
        .get_tag(tag_id)
        .await
        .map_err(|e| store_error("getting tag", e))?
        .ok_or(ErrorMessage::TagNotFound)?;

    let exists = store
        .tag_name_exists(&body.name, Some(tag_id))
        .await
        .map_err(|e| store_error("checking tag name", e))?;
    if exists {
        return Err(ErrorMessage::TagNameExisted.into());
    }

    match store.update_tag(tag_id, &body.name, &identity.full_name).await {
        Ok(tag) => Ok(tag),
        Err(e) if is_unique_violation(&e) => Err(ErrorMessage::TagNameExisted.into()),
        Err(e) => Err(store_error("updating tag", e)),
    }
}

pub async fn delete_tag<S: TagExt>(store: &S, tag_id: i64) -> Result<(), ServiceError> {
    store
        .get_tag(tag_id)
        .await
        .map_err(|e| store_error("getting tag", e))?
        .ok_or(ErrorMessage::TagNotFound)?;

    match store.delete_tag(tag_id).await {
        Ok(()) => Ok(()),
        Err(sqlx::Error::RowNotFound) => Err(ErrorMessage::TagNotFound.into()),
        Err(e) => Err(store_error("deleting tag", e)),
    }
}
