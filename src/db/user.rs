use super::DBClient;
use crate::{
    models::{Role, User},
    utils::pagination::ListParams,
};
use sqlx::{Postgres, QueryBuilder};

const USER_COLUMNS: &str =
    "id, full_name, email, password, role_id, created_at, created_by, updated_at, updated_by";

/// Columns the user listing may be ordered by
pub const USER_SORTABLE: &[&str] = &["id", "full_name", "email", "created_at", "updated_at"];

pub struct NewUser<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
    /// Argon2 PHC string, or empty for accounts created by Google sign-in
    pub password: &'a str,
    pub role: Role,
}

pub trait UserExt {
    async fn get_user_by_id(&self, user_id: i64) -> Result<Option<User>, sqlx::Error>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error>;

    /// Users with `role`, one page plus a look-ahead row, and the total count
    async fn get_users(
        &self,
        params: &ListParams,
        role: Role,
    ) -> Result<(Vec<User>, i64), sqlx::Error>;

    async fn save_user(&self, user: NewUser<'_>, created_by: &str) -> Result<User, sqlx::Error>;

    /// `password` is only replaced when `Some`
    async fn update_user(
        &self,
        user_id: i64,
        full_name: &str,
        email: &str,
        password: Option<&str>,
        updated_by: &str,
    ) -> Result<User, sqlx::Error>;

    async fn delete_user(&self, user_id: i64) -> Result<(), sqlx::Error>;

    /// Whether another user than `user_id` already uses `email`
    async fn email_taken(&self, email: &str, user_id: i64) -> Result<bool, sqlx::Error>;
}

impl UserExt for DBClient {
    async fn get_user_by_id(&self, user_id: i64) -> Result<Option<User>, sqlx::Error> {
        let query = format!(r#"SELECT {} FROM "user" WHERE id = $1"#, USER_COLUMNS);
        sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!(r#"SELECT {} FROM "user" WHERE email = $1"#, USER_COLUMNS);
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_users(
        &self,
        params: &ListParams,
        role: Role,
    ) -> Result<(Vec<User>, i64), sqlx::Error> {
        let pattern = params.search_pattern();

        let mut count: QueryBuilder<Postgres> =
            QueryBuilder::new(r#"SELECT COUNT(*) FROM "user" WHERE role_id = "#);
        count.push_bind(role.id());
        if let Some(pattern) = &pattern {
            count
                .push(" AND (full_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR email ILIKE ")
                .push_bind(pattern.clone())
                .push(")");
        }
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut rows: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            r#"SELECT {} FROM "user" WHERE role_id = "#,
            USER_COLUMNS
        ));
        rows.push_bind(role.id());
        if let Some(pattern) = &pattern {
            rows.push(" AND (full_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR email ILIKE ")
                .push_bind(pattern.clone())
                .push(")");
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

        let users = rows.build_query_as::<User>().fetch_all(&self.pool).await?;

        Ok((users, total))
    }

    async fn save_user(&self, user: NewUser<'_>, created_by: &str) -> Result<User, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO "user" (full_name, email, password, role_id, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&query)
            .bind(user.full_name)
            .bind(user.email)
            .bind(user.password)
            .bind(user.role.id())
            .bind(created_by)
            .fetch_one(&self.pool)
            .await
    }

    async fn update_user(
        &self,
        user_id: i64,
        full_name: &str,
        email: &str,
        password: Option<&str>,
        updated_by: &str,
    ) -> Result<User, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE "user"
            SET full_name = $1,
                email = $2,
                password = COALESCE($3, password),
                updated_at = NOW(),
                updated_by = $4
            WHERE id = $5
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&query)
            .bind(full_name)
            .bind(email)
            .bind(password)
            .bind(updated_by)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
    }

    /// Deletes the user. Their comments and likes go with them through the
    /// foreign keys, so their ids are first pruned from the `comments` and
    /// `likes` arrays of the articles they sit on.
    async fn delete_user(&self, user_id: i64) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE article
            SET comments = ARRAY(
                SELECT t.id FROM UNNEST(comments) WITH ORDINALITY AS t(id, n)
                WHERE t.id NOT IN (SELECT id FROM comments WHERE user_id = $1)
                ORDER BY t.n
            )
            WHERE id IN (SELECT article_id FROM comments WHERE user_id = $1)
            "#,
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE article
            SET likes = ARRAY(
                SELECT t.id FROM UNNEST(likes) WITH ORDINALITY AS t(id, n)
                WHERE t.id NOT IN (SELECT id FROM likes WHERE user_id = $1)
                ORDER BY t.n
            )
            WHERE id IN (SELECT article_id FROM likes WHERE user_id = $1)
            "#,
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query(r#"DELETE FROM "user" WHERE id = $1"#)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        tx.commit().await?;
        Ok(())
    }

    async fn email_taken(&self, email: &str, user_id: i64) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS(SELECT 1 FROM "user" WHERE email = $1 AND id <> $2)"#,
        )
        .bind(email)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }
}
