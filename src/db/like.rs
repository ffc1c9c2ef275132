use super::{DBClient, lock_article};
use crate::models::Like;

const LIKE_COLUMNS: &str =
    "id, like_count, article_id, user_id, created_at, created_by, updated_at, updated_by";

pub trait LikeExt {
    async fn get_like(&self, like_id: i64) -> Result<Option<Like>, sqlx::Error>;

    async fn get_like_by_user(
        &self,
        article_id: i64,
        user_id: i64,
    ) -> Result<Option<Like>, sqlx::Error>;

    /// Inserts the like and appends its id to `article.likes`.
    ///
    /// A second like by the same user on the same article fails with the
    /// unique violation of `likes_article_user_idx`.
    async fn save_like(
        &self,
        article_id: i64,
        user_id: i64,
        like_count: i32,
        created_by: &str,
    ) -> Result<Like, sqlx::Error>;

    async fn delete_like(&self, article_id: i64, like_id: i64) -> Result<(), sqlx::Error>;
}

impl LikeExt for DBClient {
    async fn get_like(&self, like_id: i64) -> Result<Option<Like>, sqlx::Error> {
        let query = format!("SELECT {} FROM likes WHERE id = $1", LIKE_COLUMNS);
        sqlx::query_as::<_, Like>(&query)
            .bind(like_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_like_by_user(
        &self,
        article_id: i64,
        user_id: i64,
    ) -> Result<Option<Like>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM likes WHERE article_id = $1 AND user_id = $2",
            LIKE_COLUMNS
        );
        sqlx::query_as::<_, Like>(&query)
            .bind(article_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn save_like(
        &self,
        article_id: i64,
        user_id: i64,
        like_count: i32,
        created_by: &str,
    ) -> Result<Like, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        lock_article(&mut tx, article_id).await?;

        let query = format!(
            r#"
            INSERT INTO likes (like_count, article_id, user_id, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            LIKE_COLUMNS
        );
        let saved = sqlx::query_as::<_, Like>(&query)
            .bind(like_count)
            .bind(article_id)
            .bind(user_id)
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("UPDATE article SET likes = ARRAY_APPEND(likes, $1) WHERE id = $2")
            .bind(saved.id)
            .bind(article_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(saved)
    }

    async fn delete_like(&self, article_id: i64, like_id: i64) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        lock_article(&mut tx, article_id).await?;

        let result = sqlx::query("DELETE FROM likes WHERE id = $1 AND article_id = $2")
            .bind(like_id)
            .bind(article_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        sqlx::query("UPDATE article SET likes = ARRAY_REMOVE(likes, $1) WHERE id = $2")
            .bind(like_id)
            .bind(article_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
