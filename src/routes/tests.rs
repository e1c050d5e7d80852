use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::create_routes;
use crate::{
    config::Config, media::crop::sample_png, media::memory::MemoryMediaStore,
    repositories::memory::MemoryRepo, AppState,
};

const BOUNDARY: &str = "X-BLOG-BOUNDARY";

struct TestApp {
    router: Router,
    repo: Arc<MemoryRepo>,
    media: Arc<MemoryMediaStore>,
}

fn test_app() -> TestApp {
    test_app_with(Config::for_tests())
}

fn test_app_with(config: Config) -> TestApp {
    let repo = Arc::new(MemoryRepo::new());
    let media = Arc::new(MemoryMediaStore::default());
    let state = AppState::new(
        config,
        repo.clone(),
        repo.clone(),
        media.clone(),
        None,
    );

    TestApp {
        router: create_routes(Arc::new(state)),
        repo,
        media,
    }
}

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, Vec<u8>),
}

fn multipart_body(parts: Vec<Part<'_>>) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
            Part::File(name, file_name, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(&bytes);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(uri: &str, token: Option<&str>, parts: Vec<Part<'_>>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(multipart_body(parts))).unwrap()
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send(router, req).await;
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn admin_token(router: &Router) -> String {
    let credentials = json!({ "username": "admin", "password": "hunter22" });

    let (status, _) = send(
        router,
        json_request(Method::POST, "/api/auth/register", None, credentials.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send_json(
        router,
        json_request(Method::POST, "/api/auth/login", None, credentials),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

async fn create_normal_post(router: &Router, token: &str, title: &str, date: &str) -> Value {
    let (status, body) = send_json(
        router,
        multipart_request(
            "/api/posts",
            Some(token),
            vec![
                Part::Text("title", title),
                Part::Text("date", date),
                Part::Text("content", "Line one\nLine two"),
                Part::File("images", "wide.png", sample_png(40, 20)),
                Part::File("images", "tall.png", sample_png(10, 30)),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

#[tokio::test]
async fn create_without_credentials_is_unauthorized_and_stores_nothing() {
    let app = test_app();

    let (status, body) = send_json(
        &app.router,
        multipart_request(
            "/api/posts",
            None,
            vec![
                Part::Text("title", "Sneaky"),
                Part::Text("date", "2024-03-10"),
                Part::Text("content", "nope"),
            ],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
    assert_eq!(app.repo.post_count().await, 0);
}

#[tokio::test]
async fn forged_token_is_forbidden() {
    let app = test_app();

    let (status, _) = send(
        &app.router,
        json_request(
            Method::POST,
            "/api/articles",
            Some("not-a-real-token"),
            json!({ "title": "x", "date": "2024-01-01", "sections": [] }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.repo.post_count().await, 0);
}

#[tokio::test]
async fn created_posts_are_listed_newest_first() {
    let app = test_app();
    let token = admin_token(&app.router).await;

    let older = create_normal_post(&app.router, &token, "Older", "2024-01-05").await;
    let newer = create_normal_post(&app.router, &token, "Newer", "2024-03-10T12:00:00Z").await;

    assert_eq!(newer["type"], "normal");
    assert_eq!(newer["date"], "2024-03-10");
    assert_eq!(
        newer["images"],
        json!(["/uploads/image-0.jpg", "/uploads/image-1.jpg"])
    );
    assert_eq!(app.media.stored.lock().unwrap().len(), 4);

    let (status, list) = send_json(&app.router, empty_request(Method::GET, "/api/posts", None)).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&Value> = list.as_array().unwrap().iter().map(|p| &p["id"]).collect();
    assert_eq!(ids, vec![&newer["id"], &older["id"]]);

    let uri = format!("/api/posts/{}", older["id"].as_str().unwrap());
    let (status, fetched) = send_json(&app.router, empty_request(Method::GET, &uri, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["title"], "Older");
    assert_eq!(fetched["content"], "Line one\nLine two");
}

#[tokio::test]
async fn too_many_images_are_rejected() {
    let app = test_app();
    let token = admin_token(&app.router).await;

    let mut parts = vec![
        Part::Text("title", "Gallery"),
        Part::Text("date", "2024-03-10"),
        Part::Text("content", "Six is too many"),
    ];
    for _ in 0..6 {
        parts.push(Part::File("images", "img.png", sample_png(8, 8)));
    }

    let (status, _) = send(&app.router, multipart_request("/api/posts", Some(&token), parts)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.repo.post_count().await, 0);
}

#[tokio::test]
async fn unknown_or_malformed_ids_are_not_found() {
    let app = test_app();

    for uri in [
        "/api/posts/0191e1a4-0000-7000-8000-000000000000",
        "/api/posts/not-a-uuid",
    ] {
        let (status, _) = send(&app.router, empty_request(Method::GET, uri, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn delete_removes_post_once() {
    let app = test_app();
    let token = admin_token(&app.router).await;
    let post = create_normal_post(&app.router, &token, "Short lived", "2024-02-02").await;
    let uri = format!("/api/posts/{}", post["id"].as_str().unwrap());

    let (status, body) =
        send_json(&app.router, empty_request(Method::DELETE, &uri, Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");

    let (status, _) = send(&app.router, empty_request(Method::DELETE, &uri, Some(&token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.repo.post_count().await, 0);
}

#[tokio::test]
async fn update_changes_title_and_content() {
    let app = test_app();
    let token = admin_token(&app.router).await;
    let post = create_normal_post(&app.router, &token, "Draft", "2024-02-02").await;
    let uri = format!("/api/posts/{}", post["id"].as_str().unwrap());

    let (status, updated) = send_json(
        &app.router,
        json_request(
            Method::PUT,
            &uri,
            Some(&token),
            json!({ "title": "Final", "content": "Polished" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Final");
    assert_eq!(updated["content"], "Polished");
    assert_eq!(updated["images"], post["images"]);
}

#[tokio::test]
async fn article_thumbnail_comes_from_first_section_image() {
    let app = test_app();
    let token = admin_token(&app.router).await;

    let (status, article) = send_json(
        &app.router,
        json_request(
            Method::POST,
            "/api/articles",
            Some(&token),
            json!({
                "title": "Deep dive",
                "date": "2024-05-01",
                "sections": [
                    { "subtitle": "Intro", "content": "No picture here" },
                    { "subtitle": "", "content": "Pictured", "image": "/uploads/s2.jpg" }
                ]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(article["type"], "article");
    assert!(article["sections"][1].get("subtitle").is_none());

    let (status, html) = send(&app.router, empty_request(Method::GET, "/blog", None)).await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(html).unwrap();
    assert!(html.contains(r#"src="/uploads/s2.jpg""#));
    assert!(html.contains("No picture here"));
}

#[tokio::test]
async fn upload_requires_a_file() {
    let app = test_app();
    let token = admin_token(&app.router).await;

    let (status, _) = send(
        &app.router,
        multipart_request("/api/upload", Some(&token), vec![Part::Text("note", "hi")]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send_json(
        &app.router,
        multipart_request(
            "/api/upload",
            Some(&token),
            vec![Part::File("image", "section.png", sample_png(4, 4))],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["url"], "/uploads/section.png");
}

#[tokio::test]
async fn contact_without_relay_is_bad_gateway() {
    let app = test_app();

    let (status, _) = send(
        &app.router,
        json_request(
            Method::POST,
            "/api/contact",
            None,
            json!({ "name": "Ana", "email": "not-an-email", "message": "Hola" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send_json(
        &app.router,
        json_request(
            Method::POST,
            "/api/contact",
            None,
            json!({ "name": " Ana ", "email": "ana@example.com", "message": "Hola" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn second_registration_is_forbidden() {
    let app = test_app();
    admin_token(&app.router).await;

    let (status, _) = send(
        &app.router,
        json_request(
            Method::POST,
            "/api/auth/register",
            None,
            json!({ "username": "someone", "password": "secret99" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn login_cookie_authenticates_me() {
    let app = test_app();
    let token = admin_token(&app.router).await;

    let req = Request::builder()
        .uri("/api/auth/me")
        .header(header::COOKIE, format!("token={token}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send_json(&app.router, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["username"], "admin");
    assert!(body["data"]["user"].get("password").is_none());

    let (status, _) = send(&app.router, empty_request(Method::GET, "/api/auth/me", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_sets_http_only_cookie() {
    let app = test_app();
    admin_token(&app.router).await;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/auth/login",
            None,
            json!({ "username": "admin", "password": "hunter22" }),
        ))
        .await
        .unwrap();

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn post_page_honours_image_query() {
    let app = test_app();
    let token = admin_token(&app.router).await;
    let post = create_normal_post(&app.router, &token, "Trip", "2024-04-04").await;
    let id = post["id"].as_str().unwrap();

    let (status, html) = send(
        &app.router,
        empty_request(Method::GET, &format!("/blog/{id}?image=1"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(html).unwrap();
    assert!(html.contains(r#"src="/uploads/image-1.jpg""#));
    assert!(html.contains("Line one<br>"));
    assert!(html.contains(&format!("/blog/{id}?image=0")));

    let (status, _) = send(
        &app.router,
        empty_request(Method::GET, "/blog/not-a-uuid", None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn home_page_greets_owner() {
    let app = test_app();

    let (status, html) = send(&app.router, empty_request(Method::GET, "/", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(html).unwrap().contains("Jorge"));
}

#[tokio::test]
async fn login_and_contact_forms_post_through_their_scripts() {
    let app = test_app();

    for (uri, action, script) in [
        ("/login", "/api/auth/login", "/js/login.js"),
        ("/contacto", "/api/contact", "/js/contact.js"),
    ] {
        let (status, html) = send(&app.router, empty_request(Method::GET, uri, None)).await;
        assert_eq!(status, StatusCode::OK);
        let html = String::from_utf8(html).unwrap();
        assert!(
            html.contains(&format!(r#"method="post" action="{action}""#)),
            "{uri}"
        );
        assert!(html.contains(&format!(r#"<script src="{script}""#)), "{uri}");
    }
}

#[tokio::test]
async fn dashboard_redirects_anonymous_visitors_to_login() {
    let app = test_app();

    for uri in ["/dashboard", "/dashboard/edit?id=x"] {
        let response = app
            .router
            .clone()
            .oneshot(empty_request(Method::GET, uri, None))
            .await
            .unwrap();
        assert!(response.status().is_redirection(), "{uri}");
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }

    let (status, _) = send(
        &app.router,
        empty_request(Method::GET, "/dashboard", Some("stale-token")),
    )
    .await;
    assert!(status.is_redirection());
}

#[tokio::test]
async fn dashboard_lists_posts_and_opens_the_edit_form() {
    let app = test_app();
    let token = admin_token(&app.router).await;
    let post = create_normal_post(&app.router, &token, "Road trip", "2024-04-04").await;
    let id = post["id"].as_str().unwrap();

    let req = Request::builder()
        .uri("/dashboard")
        .header(header::COOKIE, format!("token={token}"))
        .body(Body::empty())
        .unwrap();
    let (status, html) = send(&app.router, req).await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(html).unwrap();
    assert!(html.contains("Signed in as admin"));
    assert!(html.contains("Road trip"));
    assert!(html.contains(&format!("/dashboard/edit?id={id}")));
    assert!(html.contains(r#"src="/js/dashboard.js""#));

    let (status, html) = send(
        &app.router,
        empty_request(Method::GET, &format!("/dashboard/edit?id={id}"), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(html).unwrap();
    assert!(html.contains(r#"value="Road trip""#));
    assert!(html.contains("Line one\nLine two</textarea>"));

    let (status, _) = send(
        &app.router,
        empty_request(Method::GET, "/dashboard/edit?id=not-a-uuid", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let response = app
        .router
        .clone()
        .oneshot(empty_request(Method::GET, "/dashboard/edit", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.headers()[header::LOCATION], "/dashboard");
}

#[tokio::test]
async fn bearer_header_wins_over_stale_cookie() {
    let app = test_app();
    let token = admin_token(&app.router).await;

    let req = Request::builder()
        .uri("/api/auth/me")
        .header(header::COOKIE, "token=expired-or-foreign")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send_json(&app.router, req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["username"], "admin");
}

#[tokio::test]
async fn oversized_upload_is_payload_too_large() {
    let app = test_app_with(Config {
        max_upload_bytes: 4 * 1024,
        ..Config::for_tests()
    });
    let token = admin_token(&app.router).await;

    let (status, body) = send_json(
        &app.router,
        multipart_request(
            "/api/upload",
            Some(&token),
            vec![Part::File("image", "big.bin", vec![7u8; 64 * 1024])],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["error"].is_string());
    assert!(app.media.stored.lock().unwrap().is_empty());
}
