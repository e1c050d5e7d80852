use std::sync::Arc;

use axum::{
    extract::{Multipart, Path},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};

use crate::{
    media::crop::PendingImage,
    middleware::auth,
    models::{
        posts::{CreateArticleDto, CreatePostForm, UpdatePostDto, UploadResponse},
        response::Response,
    },
    AppState, Error, Result,
};

pub fn posts_handler() -> Router {
    let public = Router::new()
        .route("/posts", get(get_posts))
        .route("/posts/{id}", get(get_post));

    let protected = Router::new()
        .route("/posts", post(create_post))
        .route("/posts/{id}", put(update_post).delete(delete_post))
        .route("/articles", post(create_article))
        .route("/upload", post(upload))
        .route_layer(middleware::from_fn(auth));

    public.merge(protected)
}

async fn get_posts(Extension(app_state): Extension<Arc<AppState>>) -> Result<impl IntoResponse> {
    let posts = app_state.posts_service.get_posts().await?;
    Ok((StatusCode::OK, Json(posts)))
}

async fn get_post(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse> {
    let post = app_state.posts_service.get_post(&post_id).await?;
    Ok((StatusCode::OK, Json(post)))
}

/// Multipart form: `title`, `date`, `content` and up to five `images` files.
async fn create_post(
    Extension(app_state): Extension<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut form = CreatePostForm::default();
    let mut images = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => form.title = field.text().await?,
            "date" => form.date = field.text().await?,
            "content" => form.content = field.text().await?,
            "images" | "images[]" => {
                let file_name = field.file_name().unwrap_or("image").to_string();
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    images.push(PendingImage {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    let new_post = app_state.posts_service.create_post(form, images).await?;
    Ok((StatusCode::CREATED, Json(new_post)))
}

async fn create_article(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(article): Json<CreateArticleDto>,
) -> Result<impl IntoResponse> {
    let new_article = app_state.posts_service.create_article(article).await?;
    Ok((StatusCode::CREATED, Json(new_article)))
}

async fn update_post(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(post_id): Path<String>,
    Json(update): Json<UpdatePostDto>,
) -> Result<impl IntoResponse> {
    let updated_post = app_state
        .posts_service
        .update_post(&post_id, update)
        .await?;

    Ok((StatusCode::OK, Json(updated_post)))
}

async fn delete_post(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse> {
    app_state.posts_service.delete_post(&post_id).await?;

    Ok((StatusCode::OK, Json(Response::success("Post deleted"))))
}

/// Single file under `image`; used for article section images.
async fn upload(
    Extension(app_state): Extension<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    while let Some(field) = multipart.next_field().await? {
        if !matches!(field.name(), Some("image") | Some("file")) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let bytes = field.bytes().await?;

        let url = app_state
            .posts_service
            .upload(&file_name, bytes.to_vec())
            .await?;
        return Ok((StatusCode::CREATED, Json(UploadResponse { url })));
    }

    Err(Error::BadRequest("No file was uploaded".to_string()))
}
