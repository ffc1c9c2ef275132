use super::DBClient;
use crate::{
    models::Article,
    utils::pagination::{BlogFilter, ListParams},
};
use sqlx::{Postgres, QueryBuilder};

const ARTICLE_COLUMNS: &str = "id, title, slug, body, footer, user_id, tags, comments, likes, \
     created_at, created_by, updated_at, updated_by";

pub const BLOG_SORTABLE: &[&str] = &["id", "title", "slug", "created_at", "updated_at"];

pub struct NewArticle<'a> {
    pub title: &'a str,
    pub slug: &'a str,
    pub body: &'a str,
    pub footer: &'a str,
    pub user_id: i64,
    pub tags: &'a [i64],
}

pub trait BlogExt {
    async fn get_blog_by_id(&self, article_id: i64) -> Result<Option<Article>, sqlx::Error>;

    async fn get_blog_by_slug(&self, slug: &str) -> Result<Option<Article>, sqlx::Error>;

    async fn get_blogs(
        &self,
        params: &ListParams,
        filter: &BlogFilter,
    ) -> Result<(Vec<Article>, i64), sqlx::Error>;

    /// Whether an article other than `except_id` already uses `slug`
    async fn slug_exists(&self, slug: &str, except_id: Option<i64>) -> Result<bool, sqlx::Error>;

    async fn save_blog(
        &self,
        article: NewArticle<'_>,
        created_by: &str,
    ) -> Result<Article, sqlx::Error>;

    async fn update_blog(
        &self,
        article_id: i64,
        title: &str,
        slug: &str,
        body: &str,
        footer: &str,
        updated_by: &str,
    ) -> Result<Article, sqlx::Error>;

    async fn delete_blog(&self, article_id: i64) -> Result<(), sqlx::Error>;
}

/// Appends the `WHERE` clause shared by the count and the page query.
fn push_blog_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    pattern: Option<&String>,
    filter: &BlogFilter,
) {
    builder.push(" WHERE TRUE");

    if let Some(pattern) = pattern {
        builder
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR body ILIKE ")
            .push_bind(pattern.clone())
            .push(")");
    }

    if let Some((start, end)) = filter.date_range {
        builder
            .push(" AND created_at::DATE BETWEEN ")
            .push_bind(start)
            .push(" AND ")
            .push_bind(end);
    }

    if !filter.tags.is_empty() {
        builder
            .push(" AND tags @> ")
            .push_bind(filter.tags.clone())
            .push("::BIGINT[]");
    }
}

impl BlogExt for DBClient {
    async fn get_blog_by_id(&self, article_id: i64) -> Result<Option<Article>, sqlx::Error> {
        let query = format!("SELECT {} FROM article WHERE id = $1", ARTICLE_COLUMNS);
        sqlx::query_as::<_, Article>(&query)
            .bind(article_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_blog_by_slug(&self, slug: &str) -> Result<Option<Article>, sqlx::Error> {
        let query = format!("SELECT {} FROM article WHERE slug = $1", ARTICLE_COLUMNS);
        sqlx::query_as::<_, Article>(&query)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_blogs(
        &self,
        params: &ListParams,
        filter: &BlogFilter,
    ) -> Result<(Vec<Article>, i64), sqlx::Error> {
        let pattern = params.search_pattern();

        let mut count: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM article");
        push_blog_filters(&mut count, pattern.as_ref(), filter);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut rows: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM article", ARTICLE_COLUMNS));
        push_blog_filters(&mut rows, pattern.as_ref(), filter);
        rows.push(format!(
            " ORDER BY {} {}",
            params.field,
            params.order.as_sql()
        ))
        .push(" LIMIT ")
        .push_bind(params.fetch_limit())
        .push(" OFFSET ")
        .push_bind(params.offset());

        let articles = rows
            .build_query_as::<Article>()
            .fetch_all(&self.pool)
            .await?;

        Ok((articles, total))
    }

    async fn slug_exists(&self, slug: &str, except_id: Option<i64>) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM article
                WHERE slug = $1 AND ($2::BIGINT IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(slug)
        .bind(except_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn save_blog(
        &self,
        article: NewArticle<'_>,
        created_by: &str,
    ) -> Result<Article, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO article (title, slug, body, footer, user_id, tags, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            ARTICLE_COLUMNS
        );
        sqlx::query_as::<_, Article>(&query)
            .bind(article.title)
            .bind(article.slug)
            .bind(article.body)
            .bind(article.footer)
            .bind(article.user_id)
            .bind(article.tags)
            .bind(created_by)
            .fetch_one(&self.pool)
            .await
    }

    async fn update_blog(
        &self,
        article_id: i64,
        title: &str,
        slug: &str,
        body: &str,
        footer: &str,
        updated_by: &str,
    ) -> Result<Article, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE article
            SET title = $1, slug = $2, body = $3, footer = $4,
                updated_at = NOW(), updated_by = $5
            WHERE id = $6
            RETURNING {}
            "#,
            ARTICLE_COLUMNS
        );
        sqlx::query_as::<_, Article>(&query)
            .bind(title)
            .bind(slug)
            .bind(body)
            .bind(footer)
            .bind(updated_by)
            .bind(article_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn delete_blog(&self, article_id: i64) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM article WHERE id = $1")
            .bind(article_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }
}
