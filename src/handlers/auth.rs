use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use tower_cookies::Cookie;
use validator::Validate;

use crate::{
    middleware::{auth, AuthUser, TOKEN_COOKIE},
    models::{
        response::Response,
        users::{
            FilterUserDto, LoginUserDto, RegisterUserDto, UserData, UserLoginResponseDto,
            UserResponseDto,
        },
    },
    AppState, Error, Result,
};

pub fn auth_handler() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(get_me).layer(middleware::from_fn(auth)))
}

fn token_cookie(value: String, max_age: time::Duration) -> Result<HeaderValue> {
    let cookie = Cookie::build((TOKEN_COOKIE, value))
        .path("/")
        .max_age(max_age)
        .http_only(true)
        .build();

    HeaderValue::from_str(&cookie.to_string()).map_err(|_| Error::InternalServerError)
}

pub async fn register(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(new_user): Json<RegisterUserDto>,
) -> Result<impl IntoResponse> {
    new_user.validate()?;

    app_state
        .auth_service
        .register(&new_user.username, &new_user.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(Response::success("Registration successful! You can now sign in.")),
    ))
}

pub async fn login(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(user): Json<LoginUserDto>,
) -> Result<impl IntoResponse> {
    user.validate()?;

    let token = app_state
        .auth_service
        .login(&user.username, &user.password)
        .await?;

    let cookie = token_cookie(
        token.clone(),
        time::Duration::minutes(app_state.config.jwt_maxage),
    )?;

    let mut response = Json(UserLoginResponseDto {
        status: "success".to_string(),
        token,
    })
    .into_response();
    response.headers_mut().append(header::SET_COOKIE, cookie);

    Ok(response)
}

pub async fn logout() -> Result<impl IntoResponse> {
    let cookie = token_cookie(String::new(), time::Duration::ZERO)?;

    let mut response = Json(Response::success("Signed out")).into_response();
    response.headers_mut().append(header::SET_COOKIE, cookie);

    Ok(response)
}

async fn get_me(Extension(user): Extension<AuthUser>) -> Result<impl IntoResponse> {
    let response_data = UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: FilterUserDto::filter_user(&user.user),
        },
    };

    Ok(Json(response_data))
}
