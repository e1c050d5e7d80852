use crate::{
    models::posts::{Post, PostBody},
    services::posts::MAX_POST_IMAGES,
};

use super::{display_date, escape_html, fill_placeholders, page, post_list, preview};

const HOME: &str = include_str!("templates/home.html");
const LOGIN: &str = include_str!("templates/login.html");
const CONTACT: &str = include_str!("templates/contact.html");
const DASHBOARD: &str = include_str!("templates/dashboard.html");
const EDIT: &str = include_str!("templates/edit.html");

/// How many preview cards the home page shows.
pub const HOME_LATEST: usize = 3;

pub fn home(owner: &str, posts: &[Post]) -> String {
    let latest = &posts[..posts.len().min(HOME_LATEST)];
    let body = fill_placeholders(
        HOME,
        &[("{{owner}}", &escape_html(owner)), ("{{latest}}", &post_list(latest))],
    );
    page("Home", &body)
}

pub fn blog(posts: &[Post]) -> String {
    page("Blog", &post_list(posts))
}

pub fn post(post: &Post, image_index: usize) -> String {
    page(&post.title, &super::post_detail(post, image_index))
}

pub fn login() -> String {
    page("Sign in", LOGIN)
}

pub fn contact() -> String {
    page("Contact", CONTACT)
}

/// One row of the dashboard list, with edit and delete controls.
fn dashboard_item(post: &Post) -> String {
    let title = escape_html(&post.title);
    let kind = match post.body {
        PostBody::Article { .. } => " (Article)",
        PostBody::Normal { .. } => "",
    };

    format!(
        r#"<div class="post-item" data-id="{id}">
    <img src="{thumbnail}" alt="{title}" class="preview-image" width="200">
    <h3>{title}{kind}</h3>
    <p>{date}</p>
    <div class="post-actions">
        <a class="edit-btn" href="/dashboard/edit?id={id}">Edit</a>
        <button type="button" class="delete-btn" data-id="{id}">Delete</button>
    </div>
</div>"#,
        id = post.id,
        thumbnail = escape_html(preview(post).thumbnail),
        date = display_date(&post.date.to_string()),
    )
}

pub fn dashboard(username: &str, posts: &[Post]) -> String {
    let items = if posts.is_empty() {
        "<p>No posts yet. Create one below.</p>".to_string()
    } else {
        posts.iter().map(dashboard_item).collect::<Vec<_>>().join("\n")
    };

    let body = fill_placeholders(
        DASHBOARD,
        &[
            ("{{username}}", &escape_html(username)),
            ("{{posts}}", &items),
            ("{{max_images}}", &MAX_POST_IMAGES.to_string()),
        ],
    );
    page("Dashboard", &body)
}

/// Edit form for title and, on normal posts, the body text.
pub fn edit_post(post: &Post) -> String {
    let content_field = match &post.body {
        PostBody::Normal { content, .. } => format!(
            r#"        <label for="post-content">Content</label>
        <textarea id="post-content" name="content" rows="10" required>{}</textarea>"#,
            escape_html(content)
        ),
        PostBody::Article { sections } => format!(
            r#"        <p class="hint">This article has {} section(s); sections are not editable here.</p>"#,
            sections.len()
        ),
    };

    let body = fill_placeholders(
        EDIT,
        &[
            ("{{id}}", &post.id.to_string()),
            ("{{title}}", &escape_html(&post.title)),
            ("{{content_field}}", &content_field),
        ],
    );
    page(&format!("Edit: {}", post.title), &body)
}

pub fn not_found() -> String {
    page(
        "Not found",
        r#"<section class="not-found"><h1>Post not found</h1><a href="/blog">Back to the blog</a></section>"#,
    )
}
