//! HTML rendering for the public blog: preview cards, the detail view and the
//! page shell. Everything user-supplied goes through [`escape_html`].

use crate::models::posts::{Post, PostBody};

pub mod pages;

pub const PLACEHOLDER_IMAGE: &str = "/images/placeholder.jpg";

const LAYOUT: &str = include_str!("templates/layout.html");

/// Cyclic cursor over a post's images.
#[derive(Debug, Clone, Copy)]
pub struct Carousel<'a> {
    images: &'a [String],
    index: usize,
}

impl<'a> Carousel<'a> {
    pub fn new(images: &'a [String]) -> Self {
        Self::starting_at(images, 0)
    }

    /// Out-of-range positions wrap around.
    pub fn starting_at(images: &'a [String], index: usize) -> Self {
        let index = if images.is_empty() {
            0
        } else {
            index % images.len()
        };
        Self { images, index }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> &'a str {
        self.images
            .get(self.index)
            .map(String::as_str)
            .unwrap_or(PLACEHOLDER_IMAGE)
    }

    pub fn next_index(&self) -> usize {
        match self.images.len() {
            0 => 0,
            len => (self.index + 1) % len,
        }
    }

    pub fn prev_index(&self) -> usize {
        match self.images.len() {
            0 => 0,
            len => (self.index + len - 1) % len,
        }
    }

    pub fn next(&mut self) {
        self.index = self.next_index();
    }

    pub fn prev(&mut self) {
        self.index = self.prev_index();
    }

    /// Navigation only makes sense with more than one image.
    pub fn has_controls(&self) -> bool {
        self.images.len() > 1
    }
}

/// What a list view needs from a post.
#[derive(Debug, PartialEq)]
pub struct Preview<'a> {
    pub thumbnail: &'a str,
    pub excerpt: &'a str,
}

pub fn preview(post: &Post) -> Preview<'_> {
    match &post.body {
        PostBody::Article { sections } => Preview {
            thumbnail: sections
                .iter()
                .filter_map(|s| s.image.as_deref())
                .find(|image| !image.is_empty())
                .unwrap_or(PLACEHOLDER_IMAGE),
            excerpt: sections
                .first()
                .and_then(|s| s.content.as_deref())
                .unwrap_or_default(),
        },
        PostBody::Normal { content, images } => Preview {
            thumbnail: images
                .first()
                .map(String::as_str)
                .unwrap_or(PLACEHOLDER_IMAGE),
            excerpt: content,
        },
    }
}

/// `2024-03-09T00:00:00.000Z` becomes `09/03/2024`.
pub fn display_date(iso: &str) -> String {
    let date = iso.split('T').next().unwrap_or(iso);
    date.split('-').rev().collect::<Vec<_>>().join("/")
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Escapes, then turns newlines into `<br>`.
pub fn nl2br(text: &str) -> String {
    escape_html(text).replace("\r\n", "\n").replace('\n', "<br>")
}

/// Single pass over `template`: text substituted in is never expanded again.
pub fn fill_placeholders(template: &str, placeholders: &[(&str, &str)]) -> String {
    let mut html = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        html.push_str(&rest[..start]);
        let tail = &rest[start..];
        match placeholders.iter().find(|(key, _)| tail.starts_with(key)) {
            Some((key, value)) => {
                html.push_str(value);
                rest = &tail[key.len()..];
            }
            None => {
                html.push_str("{{");
                rest = &tail[2..];
            }
        }
    }

    html.push_str(rest);
    html
}

pub fn page(title: &str, body: &str) -> String {
    fill_placeholders(LAYOUT, &[("{{title}}", &escape_html(title)), ("{{body}}", body)])
}

pub fn preview_card(post: &Post) -> String {
    let Preview { thumbnail, excerpt } = preview(post);
    let title = escape_html(&post.title);

    format!(
        r#"<article class="post-preview">
    <img src="{thumbnail}" alt="Thumbnail of {title}" class="preview-img">
    <div class="preview-content">
        <h2>{title}</h2>
        <small>Published on {date}</small>
        <p>{excerpt}</p>
    </div>
    <a class="read-more-btn" href="/blog/{id}">Read the full article</a>
</article>"#,
        thumbnail = escape_html(thumbnail),
        date = display_date(&post.date.to_string()),
        excerpt = escape_html(excerpt),
        id = post.id,
    )
}

pub fn post_list(posts: &[Post]) -> String {
    if posts.is_empty() {
        return r#"<section id="blog-container" class="card-blog"><p>No posts yet.</p></section>"#
            .to_string();
    }

    let cards: Vec<String> = posts.iter().map(preview_card).collect();
    format!(
        r#"<section id="blog-container" class="card-blog">{}</section>"#,
        cards.join("\n")
    )
}

/// Full post view. `image_index` selects the carousel slide for normal posts.
pub fn post_detail(post: &Post, image_index: usize) -> String {
    let content = match &post.body {
        PostBody::Article { sections } => sections
            .iter()
            .map(|section| {
                let mut html = String::new();
                if let Some(subtitle) = section.subtitle.as_deref().filter(|s| !s.is_empty()) {
                    html.push_str(&format!("<h3>{}</h3>", escape_html(subtitle)));
                }
                html.push_str(&format!(
                    "<p>{}</p>",
                    nl2br(section.content.as_deref().unwrap_or_default())
                ));
                if let Some(image) = section.image.as_deref().filter(|s| !s.is_empty()) {
                    html.push_str(&format!(
                        r#"<img src="{}" alt="Section image" class="section-img">"#,
                        escape_html(image)
                    ));
                }
                html
            })
            .collect::<Vec<_>>()
            .join("\n"),
        PostBody::Normal { content, images } => {
            format!("{}\n<p>{}</p>", carousel(post, images, image_index), nl2br(content))
        }
    };

    format!(
        r#"<article class="full-post">
    <h1>{title}</h1>
    <p>Posted on {date}</p>
    <div class="full-post-content">
{content}
    </div>
    <a href="/blog" class="back-btn-blog">&larr; Back to the list</a>
</article>"#,
        title = escape_html(&post.title),
        date = display_date(&post.date.to_string()),
    )
}

fn carousel(post: &Post, images: &[String], image_index: usize) -> String {
    let carousel = Carousel::starting_at(images, image_index);
    let images_json = serde_json::to_string(images).unwrap_or_else(|_| "[]".to_string());

    let controls = if carousel.has_controls() {
        format!(
            r#"
    <a class="prev-btn" href="/blog/{id}?image={prev}">&lt;</a>
    <a class="next-btn" href="/blog/{id}?image={next}">&gt;</a>"#,
            id = post.id,
            prev = carousel.prev_index(),
            next = carousel.next_index(),
        )
    } else {
        String::new()
    };

    format!(
        r#"<div class="carousel" data-images="{images}">
    <img src="{src}" alt="{title}" class="carousel-img" data-index="{index}">{controls}
</div>"#,
        images = escape_html(&images_json),
        src = escape_html(carousel.current()),
        title = escape_html(&post.title),
        index = carousel.index(),
    )
}
