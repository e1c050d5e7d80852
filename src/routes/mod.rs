use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    Extension, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{
    handlers::{
        auth::auth_handler, contact::contact_handler, pages::pages_handler,
        posts::posts_handler,
    },
    media::UPLOADS_PREFIX,
    AppState,
};

pub fn configure_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

pub fn create_routes(app_state: Arc<AppState>) -> Router {
    let api_route = Router::new()
        .nest("/auth", auth_handler())
        .merge(posts_handler())
        .merge(contact_handler())
        .layer(TraceLayer::new_for_http());

    Router::new()
        .nest("/api", api_route)
        .merge(pages_handler())
        .nest_service(UPLOADS_PREFIX, ServeDir::new(&app_state.config.upload_dir))
        .fallback_service(ServeDir::new(&app_state.config.public_dir))
        .layer(DefaultBodyLimit::max(app_state.config.max_upload_bytes))
        .layer(Extension(app_state))
}

#[cfg(test)]
mod tests;
