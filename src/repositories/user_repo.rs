use async_trait::async_trait;
use tracing::instrument;
use uuid::Uuid;

use crate::{models::users::User, Result};

use super::PostgresRepo;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn count_users(&self) -> Result<i64>;
    /// Inserts the account only while the table is empty; `None` once any user exists.
    async fn create_first_user(&self, username: &str, password_hash: &str)
        -> Result<Option<User>>;
}

#[async_trait]
impl UserRepository for PostgresRepo {
    #[instrument(skip(self))]
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        tracing::debug!(user_found = user.is_some(), "User query completed");
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        tracing::debug!(user_found = user.is_some(), "User query completed");
        Ok(user)
    }

    async fn count_users(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    #[instrument(skip(self, password_hash))]
    async fn create_first_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<User>> {
        // `users_single_admin` makes a concurrent second insert conflict.
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, password)
            SELECT $1, $2, $3
            WHERE NOT EXISTS (SELECT 1 FROM users)
            ON CONFLICT DO NOTHING
            RETURNING id, username, password, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(username)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await?;

        tracing::debug!(created = user.is_some(), "First-user insert completed");
        Ok(user)
    }
}
