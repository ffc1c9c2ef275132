use sqlx::{Pool, Postgres, Transaction};

mod user;
pub use user::{NewUser, USER_SORTABLE, UserExt};

mod tag;
pub use tag::{TAG_SORTABLE, TagExt};

mod blog;
pub use blog::{BLOG_SORTABLE, BlogExt, NewArticle};

mod comment;
pub use comment::{COMMENT_SORTABLE, CommentExt};

mod like;
pub use like::LikeExt;

#[derive(Debug, Clone)]
pub struct DBClient {
    pool: Pool<Postgres>,
}

impl DBClient {
    pub fn new(pool: Pool<Postgres>) -> Self {
        DBClient { pool }
    }

    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Take the row lock on an article for the rest of the transaction.
///
/// Every write that touches the `comments` or `likes` array of an article
/// goes through here first, so two such writes on the same article run one
/// after the other. A missing article surfaces as `RowNotFound`.
async fn lock_article(
    tx: &mut Transaction<'_, Postgres>,
    article_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM article WHERE id = $1 FOR UPDATE")
        .bind(article_id)
        .fetch_one(&mut **tx)
        .await?;
    Ok(())
}
