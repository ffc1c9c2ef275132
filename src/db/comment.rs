use super::{DBClient, lock_article};
use crate::{models::Comment, utils::pagination::ListParams};
use sqlx::{Postgres, QueryBuilder};

const COMMENT_COLUMNS: &str =
    "id, comment, article_id, user_id, created_at, created_by, updated_at, updated_by";

pub const COMMENT_SORTABLE: &[&str] = &["id", "created_at", "updated_at"];

pub trait CommentExt {
    async fn get_comment(&self, comment_id: i64) -> Result<Option<Comment>, sqlx::Error>;

    async fn get_comments(
        &self,
        article_id: i64,
        params: &ListParams,
    ) -> Result<(Vec<Comment>, i64), sqlx::Error>;

    /// Inserts the comment and appends its id to `article.comments`
    async fn save_comment(
        &self,
        article_id: i64,
        user_id: i64,
        comment: &str,
        created_by: &str,
    ) -> Result<Comment, sqlx::Error>;

    async fn update_comment(
        &self,
        comment_id: i64,
        comment: &str,
        updated_by: &str,
    ) -> Result<Comment, sqlx::Error>;

    /// Deletes the comment and removes its id from `article.comments`
    async fn delete_comment(&self, article_id: i64, comment_id: i64) -> Result<(), sqlx::Error>;
}

impl CommentExt for DBClient {
    async fn get_comment(&self, comment_id: i64) -> Result<Option<Comment>, sqlx::Error> {
        let query = format!("SELECT {} FROM comments WHERE id = $1", COMMENT_COLUMNS);
        sqlx::query_as::<_, Comment>(&query)
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_comments(
        &self,
        article_id: i64,
        params: &ListParams,
    ) -> Result<(Vec<Comment>, i64), sqlx::Error> {
        let pattern = params.search_pattern();

        let mut count: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM comments WHERE article_id = ");
        count.push_bind(article_id);
        if let Some(pattern) = &pattern {
            count.push(" AND comment ILIKE ").push_bind(pattern.clone());
        }
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut rows: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM comments WHERE article_id = ",
            COMMENT_COLUMNS
        ));
        rows.push_bind(article_id);
        if let Some(pattern) = &pattern {
            rows.push(" AND comment ILIKE ").push_bind(pattern.clone());
        }
        rows.push(format!(
            " ORDER BY {} {}",
            params.field,
            params.order.as_sql()
        ))
        .push(" LIMIT ")
        .push_bind(params.fetch_limit())
        .push(" OFFSET ")
        .push_bind(params.offset());

        let comments = rows
            .build_query_as::<Comment>()
            .fetch_all(&self.pool)
            .await?;

        Ok((comments, total))
    }

    async fn save_comment(
        &self,
        article_id: i64,
        user_id: i64,
        comment: &str,
        created_by: &str,
    ) -> Result<Comment, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        lock_article(&mut tx, article_id).await?;

        let query = format!(
            r#"
            INSERT INTO comments (comment, article_id, user_id, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            COMMENT_COLUMNS
        );
        let saved = sqlx::query_as::<_, Comment>(&query)
            .bind(comment)
            .bind(article_id)
            .bind(user_id)
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("UPDATE article SET comments = ARRAY_APPEND(comments, $1) WHERE id = $2")
            .bind(saved.id)
            .bind(article_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(saved)
    }

    async fn update_comment(
        &self,
        comment_id: i64,
        comment: &str,
        updated_by: &str,
    ) -> Result<Comment, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE comments
            SET comment = $1, updated_at = NOW(), updated_by = $2
            WHERE id = $3
            RETURNING {}
            "#,
            COMMENT_COLUMNS
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(comment)
            .bind(updated_by)
            .bind(comment_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn delete_comment(&self, article_id: i64, comment_id: i64) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        lock_article(&mut tx, article_id).await?;

        let result = sqlx::query("DELETE FROM comments WHERE id = $1 AND article_id = $2")
            .bind(comment_id)
            .bind(article_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        sqlx::query("UPDATE article SET comments = ARRAY_REMOVE(comments, $1) WHERE id = $2")
            .bind(comment_id)
            .bind(article_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
