use crate::{
    db::{BlogExt, COMMENT_SORTABLE, CommentExt, UserExt},
    dtos::{CommentDto, ListQueryDto, Metadata},
    error::{ErrorMessage, ServiceError},
    models::{Comment, Identity},
    utils::pagination::{ListParams, paginate},
};

use super::{resolve_caller, store_error, validate_input};

async fn ensure_blog<S: BlogExt>(store: &S, article_id: i64) -> Result<(), ServiceError> {
    store
        .get_blog_by_id(article_id)
        .await
        .map_err(|e| store_error("getting blog", e))?
        .ok_or(ErrorMessage::BlogNotFound)?;
    Ok(())
}

/// The comment, provided it belongs to `article_id`
async fn find_comment<S: CommentExt>(
    store: &S,
    article_id: i64,
    comment_id: i64,
) -> Result<Comment, ServiceError> {
    store
        .get_comment(comment_id)
        .await
        .map_err(|e| store_error("getting comment", e))?
        .filter(|comment| comment.article_id == article_id)
        .ok_or(ServiceError::Rejected(ErrorMessage::CommentNotFound))
}

fn sanitise(body: &CommentDto) -> Result<String, ServiceError> {
    let cleaned = ammonia::clean(&body.comment);
    if cleaned.trim().is_empty() {
        return Err(ErrorMessage::InvalidRequest.into());
    }
    Ok(cleaned)
}

pub async fn list_comments<S: BlogExt + CommentExt>(
    store: &S,
    article_id: i64,
    query: &ListQueryDto,
) -> Result<(Vec<Comment>, Metadata), ServiceError> {
    validate_input(query, "comment list")?;
    let params = ListParams::from_query(query, COMMENT_SORTABLE)?;
    ensure_blog(store, article_id).await?;

    let (rows, total) = store
        .get_comments(article_id, &params)
        .await
        .map_err(|e| store_error("getting comments", e))?;

    Ok(paginate(rows, total, &params))
}

pub async fn create_comment<S: BlogExt + CommentExt + UserExt>(
    store: &S,
    identity: &Identity,
    article_id: i64,
    body: &CommentDto,
) -> Result<Comment, ServiceError> {
    validate_input(body, "comment")?;
    let comment = sanitise(body)?;

    ensure_blog(store, article_id).await?;
    let caller = resolve_caller(store, identity).await?;

    match store
        .save_comment(article_id, caller.id, &comment, &caller.full_name)
        .await
    {
        Ok(comment) => Ok(comment),
        // Article removed between the check and the row lock
        Err(sqlx::Error::RowNotFound) => Err(ErrorMessage::BlogNotFound.into()),
        Err(e) => Err(store_error("saving comment", e)),
    }
}

pub async fn update_comment<S: CommentExt + UserExt>(
    store: &S,
    identity: &Identity,
    article_id: i64,
    comment_id: i64,
    body: &CommentDto,
) -> Result<Comment, ServiceError> {
    validate_input(body, "comment")?;
    let text = sanitise(body)?;

    let comment = find_comment(store, article_id, comment_id).await?;
    let caller = resolve_caller(store, identity).await?;
    if comment.user_id != caller.id {
        return Err(ErrorMessage::ForbiddenUpdate.into());
    }

    match store
        .update_comment(comment.id, &text, &caller.full_name)
        .await
    {
        Ok(comment) => Ok(comment),
        Err(sqlx::Error::RowNotFound) => Err(ErrorMessage::CommentNotFound.into()),
        Err(e) => Err(store_error("updating comment", e)),
    }
}

pub async fn delete_comment<S: CommentExt + UserExt>(
    store: &S,
    identity: &Identity,
    article_id: i64,
    comment_id: i64,
) -> Result<(), ServiceError> {
    let comment = find_comment(store, article_id, comment_id).await?;
    let caller = resolve_caller(store, identity).await?;
    if comment.user_id != caller.id {
        return Err(ErrorMessage::ForbiddenDelete.into());
    }

    match store.delete_comment(article_id, comment.id).await {
        Ok(()) => Ok(()),
        Err(sqlx::Error::RowNotFound) => Err(ErrorMessage::CommentNotFound.into()),
        Err(e) => Err(store_error("deleting comment", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::Role, service::fakes::MemoryStore};

    fn text(comment: &str) -> CommentDto {
        CommentDto {
            comment: comment.to_string(),
        }
    }

    #[tokio::test]
    async fn comment_ids_follow_the_article() {
        let store = MemoryStore::new();
        let alice = store.seed_user("Alice Doe", "alice@example.com", Some("secret"), Role::Guest);
        let article = store.seed_article(alice.id, "Some post", "some-post", vec![]);

        let comment = create_comment(&store, &alice.identity(), article.id, &text("Nice one"))
            .await
            .unwrap();
        assert_eq!(store.article(article.id).unwrap().comments, vec![comment.id]);

        delete_comment(&store, &alice.identity(), article.id, comment.id)
            .await
            .unwrap();
        assert!(store.article(article.id).unwrap().comments.is_empty());
        assert!(store.comment(comment.id).is_none());
    }

    #[tokio::test]
    async fn non_owner_update_is_forbidden_and_changes_nothing() {
        let store = MemoryStore::new();
        let alice = store.seed_user("Alice Doe", "alice@example.com", Some("secret"), Role::Guest);
        let bob = store.seed_user("Bob Smith", "bob@example.com", Some("secret"), Role::Guest);
        let article = store.seed_article(alice.id, "Some post", "some-post", vec![]);
        let comment = create_comment(&store, &alice.identity(), article.id, &text("Original"))
            .await
            .unwrap();
        let writes = store.writes();

        let err = update_comment(&store, &bob.identity(), article.id, comment.id, &text("Edited"))
            .await
            .unwrap_err();
        assert_eq!(err.rejection(), Some(&ErrorMessage::ForbiddenUpdate));
        assert_eq!(store.writes(), writes);
        assert_eq!(store.comment(comment.id).unwrap().comment, "Original");

        let err = delete_comment(&store, &bob.identity(), article.id, comment.id)
            .await
            .unwrap_err();
        assert_eq!(err.rejection(), Some(&ErrorMessage::ForbiddenDelete));
        assert_eq!(store.writes(), writes);
    }

    #[tokio::test]
    async fn comment_on_other_article_is_not_found() {
        let store = MemoryStore::new();
        let alice = store.seed_user("Alice Doe", "alice@example.com", Some("secret"), Role::Guest);
        let first = store.seed_article(alice.id, "First post", "first-post", vec![]);
        let second = store.seed_article(alice.id, "Second post", "second-post", vec![]);
        let comment = create_comment(&store, &alice.identity(), first.id, &text("Hello"))
            .await
            .unwrap();

        let err = update_comment(&store, &alice.identity(), second.id, comment.id, &text("Moved"))
            .await
            .unwrap_err();
        assert_eq!(err.rejection(), Some(&ErrorMessage::CommentNotFound));
    }

    #[tokio::test]
    async fn comment_on_missing_blog() {
        let store = MemoryStore::new();
        let alice = store.seed_user("Alice Doe", "alice@example.com", Some("secret"), Role::Guest);

        let err = create_comment(&store, &alice.identity(), 77, &text("Hello"))
            .await
            .unwrap_err();
        assert_eq!(err.rejection(), Some(&ErrorMessage::BlogNotFound));
    }

    #[tokio::test]
    async fn markup_only_comment_is_rejected() {
        let store = MemoryStore::new();
        let alice = store.seed_user("Alice Doe", "alice@example.com", Some("secret"), Role::Guest);
        let article = store.seed_article(alice.id, "Some post", "some-post", vec![]);

        let err = create_comment(&store, &alice.identity(), article.id, &text("<script>x</script>"))
            .await
            .unwrap_err();
        assert_eq!(err.rejection(), Some(&ErrorMessage::InvalidRequest));
    }
}
