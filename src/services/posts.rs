use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    media::{
        crop::{CropSession, PendingImage, CAROUSEL_SIDE},
        MediaStore,
    },
    models::posts::{
        parse_date, CreateArticleDto, CreatePostForm, NewPost, Post, PostBody, Section,
        UpdatePostDto,
    },
    repositories::posts_repo::PostsRepository,
    Error, Result,
};

/// Upper bound on carousel images attached to one post.
pub const MAX_POST_IMAGES: usize = 5;

#[derive(Clone)]
pub struct PostsService {
    repo: Arc<dyn PostsRepository>,
    media: Arc<dyn MediaStore>,
}

fn parse_post_id(post_id: &str) -> Result<Uuid> {
    Uuid::parse_str(post_id).map_err(|_| Error::NotFound)
}

impl PostsService {
    pub fn new(repo: Arc<dyn PostsRepository>, media: Arc<dyn MediaStore>) -> Self {
        Self { repo, media }
    }

    pub async fn get_posts(&self) -> Result<Vec<Post>> {
        self.repo.list_posts().await
    }

    pub async fn get_post(&self, post_id: &str) -> Result<Post> {
        let post_id = parse_post_id(post_id)?;
        self.repo.find_post(post_id).await?.ok_or(Error::NotFound)
    }

    /// Crops and stores every image before the post is written. A failure
    /// part-way leaves the already stored files behind.
    pub async fn create_post(
        &self,
        form: CreatePostForm,
        images: Vec<PendingImage>,
    ) -> Result<Post> {
        form.validate()?;
        let date = parse_date(&form.date)?;

        if images.len() > MAX_POST_IMAGES {
            return Err(Error::BadRequest(format!(
                "At most {MAX_POST_IMAGES} images per post"
            )));
        }

        let cropped = tokio::task::spawn_blocking(move || {
            CropSession::new(images).crop_all(CAROUSEL_SIDE)
        })
        .await
        .map_err(|err| {
            tracing::error!("Crop task failed: {:?}", err);
            Error::InternalServerError
        })??;

        let mut urls = Vec::with_capacity(cropped.len());
        for (index, bytes) in cropped.into_iter().enumerate() {
            urls.push(self.media.store(&format!("image-{index}.jpg"), bytes).await?);
        }

        self.repo
            .insert_post(NewPost {
                title: form.title,
                date,
                body: PostBody::Normal {
                    content: form.content,
                    images: urls,
                },
            })
            .await
    }

    pub async fn create_article(&self, article: CreateArticleDto) -> Result<Post> {
        article.validate()?;

        self.repo
            .insert_post(NewPost {
                title: article.title,
                date: article.date,
                body: PostBody::Article {
                    sections: article
                        .sections
                        .into_iter()
                        .map(Section::normalized)
                        .collect(),
                },
            })
            .await
    }

    pub async fn update_post(&self, post_id: &str, update: UpdatePostDto) -> Result<Post> {
        update.validate()?;

        let mut post = self.get_post(post_id).await?;
        post.apply_update(update)?;

        self.repo.update_post(&post).await?.ok_or(Error::NotFound)
    }

    pub async fn delete_post(&self, post_id: &str) -> Result<()> {
        let post_id = parse_post_id(post_id)?;

        if !self.repo.delete_post(post_id).await? {
            return Err(Error::NotFound);
        }

        tracing::info!(%post_id, "Post deleted");
        Ok(())
    }

    /// Stores a single file as-is, for section images uploaded ahead of an article.
    pub async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String> {
        if bytes.is_empty() {
            return Err(Error::BadRequest("Uploaded file is empty".to_string()));
        }
        self.media.store(file_name, bytes).await
    }
}
