use async_trait::async_trait;
use sqlx::types::Json;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    models::posts::{NewPost, Post, PostBody, PostRow},
    Result,
};

use super::PostgresRepo;

const POST_COLUMNS: &str = "id, title, date, kind, content, images, sections";

#[async_trait]
pub trait PostsRepository: Sync + Send {
    /// All posts, newest `date` first.
    async fn list_posts(&self) -> Result<Vec<Post>>;
    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>>;
    async fn insert_post(&self, post: NewPost) -> Result<Post>;
    /// Writes back title and content; `None` when the post no longer exists.
    async fn update_post(&self, post: &Post) -> Result<Option<Post>>;
    /// Returns whether a row was removed.
    async fn delete_post(&self, post_id: Uuid) -> Result<bool>;
}

#[async_trait]
impl PostsRepository for PostgresRepo {
    #[instrument(skip(self))]
    async fn list_posts(&self) -> Result<Vec<Post>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts ORDER BY date DESC, id DESC");
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(count = rows.len(), "Fetched posts");
        rows.into_iter().map(Post::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Post::try_from).transpose()
    }

    #[instrument(skip(self, post), fields(title = %post.title))]
    async fn insert_post(&self, post: NewPost) -> Result<Post> {
        let id = Uuid::now_v7();
        let kind = post.body.kind();
        let (content, images, sections) = match post.body {
            PostBody::Normal { content, images } => (Some(content), images, Vec::new()),
            PostBody::Article { sections } => (None, Vec::new(), sections),
        };

        let sql = format!(
            r#"
            INSERT INTO posts (id, title, date, kind, content, images, sections)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {POST_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .bind(post.title)
            .bind(post.date)
            .bind(kind.to_str())
            .bind(content)
            .bind(images)
            .bind(Json(sections))
            .fetch_one(&self.pool)
            .await?;

        tracing::info!(post_id = %id, kind = kind.to_str(), "Post created");
        Post::try_from(row)
    }

    #[instrument(skip(self, post), fields(post_id = %post.id))]
    async fn update_post(&self, post: &Post) -> Result<Option<Post>> {
        let content = match &post.body {
            PostBody::Normal { content, .. } => Some(content.as_str()),
            PostBody::Article { .. } => None,
        };

        let sql = format!(
            r#"
            UPDATE posts
            SET title = $2,
                content = COALESCE($3, content)
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(post.id)
            .bind(&post.title)
            .bind(content)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Post::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn delete_post(&self, post_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
