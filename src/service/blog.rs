use std::collections::BTreeSet;

use crate::{
    db::{BLOG_SORTABLE, BlogExt, NewArticle, TagExt, UserExt},
    dtos::{BlogQueryDto, CreateBlogDto, Metadata, UpdateBlogDto},
    error::{ErrorMessage, ServiceError},
    models::{Article, Identity},
    utils::{
        pagination::{BlogFilter, ListParams, paginate},
        slug::generate_slug,
    },
};

use super::{is_unique_violation, resolve_caller, store_error, validate_input};

pub async fn list_blogs<S: BlogExt>(
    store: &S,
    query: &BlogQueryDto,
) -> Result<(Vec<Article>, Metadata), ServiceError> {
    validate_input(query, "blog list")?;
    let params = ListParams::from_query(&query.list_query(), BLOG_SORTABLE)?;
    let filter = BlogFilter::from_query(query)?;

    let (rows, total) = store
        .get_blogs(&params, &filter)
        .await
        .map_err(|e| store_error("getting blogs", e))?;

    Ok(paginate(rows, total, &params))
}

pub async fn get_blog<S: BlogExt>(store: &S, slug: &str) -> Result<Article, ServiceError> {
    store
        .get_blog_by_slug(slug)
        .await
        .map_err(|e| store_error("getting blog", e))?
        .ok_or(ServiceError::Rejected(ErrorMessage::BlogNotFound))
}

async fn find_blog<S: BlogExt>(store: &S, article_id: i64) -> Result<Article, ServiceError> {
    store
        .get_blog_by_id(article_id)
        .await
        .map_err(|e| store_error("getting blog", e))?
        .ok_or(ServiceError::Rejected(ErrorMessage::BlogNotFound))
}

/// Slug for `title`, rejected when it is empty or already used by another
/// article than `except_id`.
async fn unique_slug<S: BlogExt>(
    store: &S,
    title: &str,
    except_id: Option<i64>,
) -> Result<String, ServiceError> {
    let slug = generate_slug(title);
    if slug.is_empty() {
        return Err(ErrorMessage::InvalidRequest.into());
    }

    let exists = store
        .slug_exists(&slug, except_id)
        .await
        .map_err(|e| store_error("checking slug", e))?;
    if exists {
        return Err(ErrorMessage::BlogExisted.into());
    }

    Ok(slug)
}

pub async fn create_blog<S: BlogExt + TagExt + UserExt>(
    store: &S,
    identity: &Identity,
    body: &CreateBlogDto,
) -> Result<Article, ServiceError> {
    validate_input(body, "blog")?;

    let tags: Vec<i64> = body
        .tags
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let found = store
        .existing_tag_ids(&tags)
        .await
        .map_err(|e| store_error("checking tags", e))?;
    if found.len() != tags.len() {
        return Err(ErrorMessage::TagNotFound.into());
    }

    let caller = resolve_caller(store, identity).await?;
    let slug = unique_slug(store, &body.title, None).await?;

    let body_html = ammonia::clean(&body.body);
    let footer_html = ammonia::clean(&body.footer);

    let article = NewArticle {
        title: &body.title,
        slug: &slug,
        body: &body_html,
        footer: &footer_html,
        user_id: caller.id,
        tags: &tags,
    };

    match store.save_blog(article, &caller.full_name).await {
        Ok(article) => Ok(article),
        Err(e) if is_unique_violation(&e) => Err(ErrorMessage::BlogExisted.into()),
        Err(e) => Err(store_error("saving blog", e)),
    }
}

pub async fn update_blog<S: BlogExt + UserExt>(
    store: &S,
    identity: &Identity,
    article_id: i64,
    body: &UpdateBlogDto,
) -> Result<Article, ServiceError> {
    validate_input(body, "blog")?;

    let article = find_blog(store, article_id).await?;
    let caller = resolve_caller(store, identity).await?;
    if article.user_id != caller.id {
        return Err(ErrorMessage::ForbiddenUpdate.into());
    }

    let slug = unique_slug(store, &body.title, Some(article.id)).await?;
    let body_html = ammonia::clean(&body.body);
    let footer_html = ammonia::clean(&body.footer);

    match store
        .update_blog(
            article.id,
            &body.title,
            &slug,
            &body_html,
            &footer_html,
            &caller.full_name,
        )
        .await
    {
        Ok(article) => Ok(article),
        Err(e) if is_unique_violation(&e) => Err(ErrorMessage::BlogExisted.into()),
        Err(e) => Err(store_error("updating blog", e)),
    }
}

pub async fn delete_blog<S: BlogExt + UserExt>(
    store: &S,
    identity: &Identity,
    article_id: i64,
) -> Result<(), ServiceError> {
    let article = find_blog(store, article_id).await?;
    let caller = resolve_caller(store, identity).await?;
    if article.user_id != caller.id {
        return Err(ErrorMessage::ForbiddenDelete.into());
    }

    match store.delete_blog(article.id).await {
        Ok(()) => Ok(()),
        Err(sqlx::Error::RowNotFound) => Err(ErrorMessage::BlogNotFound.into()),
        Err(e) => Err(store_error("deleting blog", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::Role, service::fakes::MemoryStore};

    fn create_body(title: &str, tags: Vec<i64>) -> CreateBlogDto {
        CreateBlogDto {
            title: title.to_string(),
            body: "Lorem ipsum dolor sit amet. ".repeat(5),
            footer: "Thanks for reading".to_string(),
            tags,
        }
    }

    fn update_body(title: &str) -> UpdateBlogDto {
        UpdateBlogDto {
            title: title.to_string(),
            body: "Consectetur adipiscing elit. ".repeat(5),
            footer: "See you next time".to_string(),
        }
    }

    #[tokio::test]
    async fn create_derives_slug_and_owner() {
        let store = MemoryStore::new();
        let alice = store.seed_user("Alice Doe", "alice@example.com", Some("secret"), Role::Author);
        let tag = store.seed_tag("Rustacean");

        let body = create_body("Hello, World!  Go", vec![tag.id]);
        let article = create_blog(&store, &alice.identity(), &body)
            .await
            .unwrap();
        assert_eq!(article.slug, "hello-world-go");
        assert_eq!(article.user_id, alice.id);
        assert_eq!(article.created_by, "Alice Doe");

        let fetched = get_blog(&store, "hello-world-go").await.unwrap();
        assert_eq!(fetched.id, article.id);
    }

    #[tokio::test]
    async fn same_title_twice_is_rejected() {
        let store = MemoryStore::new();
        let alice = store.seed_user("Alice Doe", "alice@example.com", Some("secret"), Role::Author);
        let tag = store.seed_tag("Rustacean");

        create_blog(&store, &alice.identity(), &create_body("Async Rust", vec![tag.id]))
            .await
            .unwrap();
        let err = create_blog(&store, &alice.identity(), &create_body("async  rust!", vec![tag.id]))
            .await
            .unwrap_err();
        assert_eq!(err.rejection(), Some(&ErrorMessage::BlogExisted));
    }

    #[tokio::test]
    async fn unknown_tag_is_rejected() {
        let store = MemoryStore::new();
        let alice = store.seed_user("Alice Doe", "alice@example.com", Some("secret"), Role::Author);
        let tag = store.seed_tag("Rustacean");

        let body = create_body("Async Rust", vec![tag.id, 999]);
        let err = create_blog(&store, &alice.identity(), &body)
            .await
            .unwrap_err();
        assert_eq!(err.rejection(), Some(&ErrorMessage::TagNotFound));
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn body_is_sanitised() {
        let store = MemoryStore::new();
        let alice = store.seed_user("Alice Doe", "alice@example.com", Some("secret"), Role::Author);
        let tag = store.seed_tag("Rustacean");

        let mut body = create_body("Script Kiddies", vec![tag.id]);
        body.body = format!("<script>alert(1)</script><p>{}</p>", "x".repeat(100));
        let article = create_blog(&store, &alice.identity(), &body).await.unwrap();

        assert!(!article.body.contains("<script>"));
        assert!(article.body.contains("<p>"));
    }

    #[tokio::test]
    async fn only_owner_may_update_or_delete() {
        let store = MemoryStore::new();
        let alice = store.seed_user("Alice Doe", "alice@example.com", Some("secret"), Role::Author);
        let bob = store.seed_user("Bob Smith", "bob@example.com", Some("secret"), Role::Author);
        let article = store.seed_article(alice.id, "Original title", "original-title", vec![]);

        let err = update_blog(&store, &bob.identity(), article.id, &update_body("Stolen title"))
            .await
            .unwrap_err();
        assert_eq!(err.rejection(), Some(&ErrorMessage::ForbiddenUpdate));

        let err = delete_blog(&store, &bob.identity(), article.id).await.unwrap_err();
        assert_eq!(err.rejection(), Some(&ErrorMessage::ForbiddenDelete));
        assert_eq!(store.writes(), 0);

        let body = update_body("Better Title");
        let updated = update_blog(&store, &alice.identity(), article.id, &body)
            .await
            .unwrap();
        assert_eq!(updated.slug, "better-title");

        delete_blog(&store, &alice.identity(), article.id).await.unwrap();
        assert!(store.article(article.id).is_none());
    }

    #[tokio::test]
    async fn keeping_the_title_keeps_the_slug() {
        let store = MemoryStore::new();
        let alice = store.seed_user("Alice Doe", "alice@example.com", Some("secret"), Role::Author);
        let article = store.seed_article(alice.id, "Same Title", "same-title", vec![]);

        let updated = update_blog(&store, &alice.identity(), article.id, &update_body("Same Title"))
            .await
            .unwrap();
        assert_eq!(updated.slug, "same-title");
    }

    #[tokio::test]
    async fn missing_blog_is_not_found() {
        let store = MemoryStore::new();
        let err = get_blog(&store, "nope").await.unwrap_err();
        assert_eq!(err.rejection(), Some(&ErrorMessage::BlogNotFound));
    }

    #[tokio::test]
    async fn listing_filters_by_tag() {
        let store = MemoryStore::new();
        store.seed_article(1, "First post", "first-post", vec![1, 2]);
        store.seed_article(1, "Second post", "second-post", vec![2]);
        store.seed_article(1, "Third post", "third-post", vec![3]);

        let query = BlogQueryDto {
            tags: Some("2".to_string()),
            order: Some("desc".to_string()),
            ..Default::default()
        };
        let (blogs, meta) = list_blogs(&store, &query).await.unwrap();
        assert_eq!(meta.total_data, 2);
        assert_eq!(meta.order, "DESC");
        assert_eq!(blogs[0].slug, "second-post");
    }
}
