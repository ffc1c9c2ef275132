use super::DBClient;
use crate::{models::Tag, utils::pagination::ListParams};
use sqlx::{Postgres, QueryBuilder};

const TAG_COLUMNS: &str = "id, name, created_at, created_by, updated_at, updated_by";

pub const TAG_SORTABLE: &[&str] = &["id", "name", "created_at", "updated_at"];

pub trait TagExt {
    async fn get_tag(&self, tag_id: i64) -> Result<Option<Tag>, sqlx::Error>;

    async fn get_tags(&self, params: &ListParams) -> Result<(Vec<Tag>, i64), sqlx::Error>;

    /// Case-insensitive name lookup, ignoring `except_id` when given
    async fn tag_name_exists(&self, name: &str, except_id: Option<i64>)
    -> Result<bool, sqlx::Error>;

    /// Which of `tag_ids` exist
    async fn existing_tag_ids(&self, tag_ids: &[i64]) -> Result<Vec<i64>, sqlx::Error>;

    async fn save_tag(&self, name: &str, created_by: &str) -> Result<Tag, sqlx::Error>;

    async fn update_tag(&self, tag_id: i64, name: &str, updated_by: &str)
    -> Result<Tag, sqlx::Error>;

    /// Deletes the tag and drops it from every article tagged with it
    async fn delete_tag(&self, tag_id: i64) -> Result<(), sqlx::Error>;
}

impl TagExt for DBClient {
    async fn get_tag(&self, tag_id: i64) -> Result<Option<Tag>, sqlx::Error> {
        let query = format!("SELECT {} FROM tag WHERE id = $1", TAG_COLUMNS);
        sqlx::query_as::<_, Tag>(&query)
            .bind(tag_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_tags(&self, params: &ListParams) -> Result<(Vec<Tag>, i64), sqlx::Error> {
        let pattern = params.search_pattern();

        let mut count: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM tag");
        if let Some(pattern) = &pattern {
            count.push(" WHERE name ILIKE ").push_bind(pattern.clone());
        }
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut rows: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM tag", TAG_COLUMNS));
        if let Some(pattern) = &pattern {
            rows.push(" WHERE name ILIKE ").push_bind(pattern.clone());
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

        let tags = rows.build_query_as::<Tag>().fetch_all(&self.pool).await?;

        Ok((tags, total))
    }

    async fn tag_name_exists(
        &self,
        name: &str,
        except_id: Option<i64>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM tag
                WHERE LOWER(name) = LOWER($1) AND ($2::BIGINT IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(name)
        .bind(except_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn existing_tag_ids(&self, tag_ids: &[i64]) -> Result<Vec<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT id FROM tag WHERE id = ANY($1)")
            .bind(tag_ids)
            .fetch_all(&self.pool)
            .await
    }

    async fn save_tag(&self, name: &str, created_by: &str) -> Result<Tag, sqlx::Error> {
        let query = format!(
            "INSERT INTO tag (name, created_by) VALUES ($1, $2) RETURNING {}",
            TAG_COLUMNS
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(name)
            .bind(created_by)
            .fetch_one(&self.pool)
            .await
    }

    async fn update_tag(
        &self,
        tag_id: i64,
        name: &str,
        updated_by: &str,
    ) -> Result<Tag, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE tag
            SET name = $1, updated_at = NOW(), updated_by = $2
            WHERE id = $3
            RETURNING {}
            "#,
            TAG_COLUMNS
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(name)
            .bind(updated_by)
            .bind(tag_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn delete_tag(&self, tag_id: i64) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE article SET tags = ARRAY_REMOVE(tags, $1) WHERE $1 = ANY(tags)")
            .bind(tag_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM tag WHERE id = $1")
            .bind(tag_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        tx.commit().await?;
        Ok(())
    }
}
