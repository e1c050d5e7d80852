use std::sync::Arc;

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use crate::{models::users::User, AppState, Error, Result};

pub const TOKEN_COOKIE: &str = "token";

/// The authenticated administrator, inserted by [`auth`] for downstream handlers.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
}

/// An explicit `Authorization: Bearer` header wins over the session cookie.
fn bearer_token(req: &Request) -> Option<String> {
    let from_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|auth_header| auth_header.to_str().ok())
        .and_then(|auth_value| auth_value.strip_prefix("Bearer "))
        .map(|stripped| stripped.trim().to_string())
        .filter(|token| !token.is_empty());

    from_header.or_else(|| {
        CookieJar::from_headers(req.headers())
            .get(TOKEN_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|token| !token.is_empty())
    })
}

fn authenticate_request(req: &Request) -> impl std::future::Future<Output = Result<User>> + Send {
    let app_state = req
        .extensions()
        .get::<Arc<AppState>>()
        .cloned()
        .ok_or_else(|| {
            tracing::error!("AppState extension missing from request");
            Error::InternalServerError
        });
    let token = bearer_token(req).ok_or(Error::Unauthorized);

    async move {
        let app_state = app_state?;
        let token = token?;
        app_state.auth_service.authenticate(&token).await
    }
}

/// Missing credentials are `Unauthorized`; anything that fails verification is `Forbidden`.
pub async fn auth(mut req: Request, next: Next) -> Result<impl IntoResponse> {
    let user = authenticate_request(&req).await?;

    tracing::debug!(user_id = %user.id, "Request authenticated");
    req.extensions_mut().insert(AuthUser { user });

    Ok(next.run(req).await)
}

/// Same check as [`auth`] for HTML pages: rejected visitors go to `/login`.
pub async fn page_auth(mut req: Request, next: Next) -> Response {
    match authenticate_request(&req).await {
        Ok(user) => {
            req.extensions_mut().insert(AuthUser { user });
            next.run(req).await
        }
        Err(Error::Unauthorized | Error::Forbidden) => Redirect::to("/login").into_response(),
        Err(err) => err.into_response(),
    }
}
