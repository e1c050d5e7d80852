use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Extension, Router,
};
use serde::Deserialize;

use crate::{
    middleware::{page_auth, AuthUser},
    render::pages,
    AppState, Error, Result,
};

pub fn pages_handler() -> Router {
    let public = Router::new()
        .route("/", get(home))
        .route("/blog", get(blog))
        .route("/blog/{id}", get(blog_post))
        .route("/login", get(login))
        .route("/contacto", get(contact));

    let protected = Router::new()
        .route("/dashboard", get(dashboard))
        .route("/dashboard/edit", get(edit_post))
        .route_layer(middleware::from_fn(page_auth));

    public.merge(protected)
}

#[derive(Debug, Deserialize)]
struct CarouselQuery {
    image: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EditQuery {
    id: Option<String>,
}

async fn home(Extension(app_state): Extension<Arc<AppState>>) -> Result<impl IntoResponse> {
    let posts = app_state.posts_service.get_posts().await?;
    Ok(Html(pages::home(&app_state.config.site_owner, &posts)))
}

async fn blog(Extension(app_state): Extension<Arc<AppState>>) -> Result<impl IntoResponse> {
    let posts = app_state.posts_service.get_posts().await?;
    Ok(Html(pages::blog(&posts)))
}

async fn blog_post(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(post_id): Path<String>,
    Query(query): Query<CarouselQuery>,
) -> Result<Response> {
    match app_state.posts_service.get_post(&post_id).await {
        Ok(post) => Ok(Html(pages::post(&post, query.image.unwrap_or(0))).into_response()),
        Err(Error::NotFound) => Ok((StatusCode::NOT_FOUND, Html(pages::not_found())).into_response()),
        Err(err) => Err(err),
    }
}

async fn login() -> Html<String> {
    Html(pages::login())
}

async fn contact() -> Html<String> {
    Html(pages::contact())
}

async fn dashboard(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let posts = app_state.posts_service.get_posts().await?;
    Ok(Html(pages::dashboard(&auth.user.username, &posts)))
}

async fn edit_post(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<EditQuery>,
) -> Result<Response> {
    let Some(post_id) = query.id.filter(|id| !id.is_empty()) else {
        return Ok(Redirect::to("/dashboard").into_response());
    };

    match app_state.posts_service.get_post(&post_id).await {
        Ok(post) => Ok(Html(pages::edit_post(&post)).into_response()),
        Err(Error::NotFound) => Ok((StatusCode::NOT_FOUND, Html(pages::not_found())).into_response()),
        Err(err) => Err(err),
    }
}
