use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    models::{
        posts::{NewPost, Post},
        users::User,
    },
    Result,
};

use super::{posts_repo::PostsRepository, user_repo::UserRepository};

/// In-memory stand-in for Postgres used by the handler tests.
#[derive(Default)]
pub struct MemoryRepo {
    posts: RwLock<HashMap<Uuid, Post>>,
    users: RwLock<Vec<User>>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn post_count(&self) -> usize {
        self.posts.read().await.len()
    }
}

#[async_trait]
impl PostsRepository for MemoryRepo {
    async fn list_posts(&self) -> Result<Vec<Post>> {
        let mut posts: Vec<Post> = self.posts.read().await.values().cloned().collect();
        posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
        Ok(posts)
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        Ok(self.posts.read().await.get(&post_id).cloned())
    }

    async fn insert_post(&self, post: NewPost) -> Result<Post> {
        let post = Post {
            id: Uuid::now_v7(),
            title: post.title,
            date: post.date,
            body: post.body,
        };
        self.posts.write().await.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update_post(&self, post: &Post) -> Result<Option<Post>> {
        let mut posts = self.posts.write().await;
        Ok(posts.get_mut(&post.id).map(|stored| {
            *stored = post.clone();
            stored.clone()
        }))
    }

    async fn delete_post(&self, post_id: Uuid) -> Result<bool> {
        Ok(self.posts.write().await.remove(&post_id).is_some())
    }
}

#[async_trait]
impl UserRepository for MemoryRepo {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn count_users(&self) -> Result<i64> {
        Ok(self.users.read().await.len() as i64)
    }

    async fn create_first_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<User>> {
        let mut users = self.users.write().await;
        if !users.is_empty() {
            return Ok(None);
        }
        let user = User {
            id: Uuid::now_v7(),
            username: username.to_string(),
            password: password_hash.to_string(),
            created_at: Utc::now(),
        };
        users.push(user.clone());
        Ok(Some(user))
    }
}
