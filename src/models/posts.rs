use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::types::Json;
use uuid::Uuid;
use validator::Validate;

use crate::{Error, Result};

/// A blog entry. The payload lives in [`PostBody`], so a normal post can never
/// carry sections and an article can never carry a carousel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub date: NaiveDate,
    #[serde(flatten)]
    pub body: PostBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PostBody {
    Normal {
        content: String,
        #[serde(default)]
        images: Vec<String>,
    },
    Article {
        #[serde(default)]
        sections: Vec<Section>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostKind {
    Normal,
    Article,
}

impl PostKind {
    pub fn to_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Article => "article",
        }
    }
}

impl PostBody {
    pub fn kind(&self) -> PostKind {
        match self {
            Self::Normal { .. } => PostKind::Normal,
            Self::Article { .. } => PostKind::Article,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Section {
    /// The dashboard submits blank inputs as empty strings.
    pub fn normalized(self) -> Self {
        fn non_blank(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }

        Self {
            subtitle: non_blank(self.subtitle),
            content: self.content,
            image: non_blank(self.image),
        }
    }
}

/// Storage shape of a post: one row per document, sections kept as JSONB.
#[derive(Debug, sqlx::FromRow)]
pub struct PostRow {
    pub id: Uuid,
    pub title: String,
    pub date: NaiveDate,
    pub kind: String,
    pub content: Option<String>,
    pub images: Vec<String>,
    pub sections: Json<Vec<Section>>,
}

impl TryFrom<PostRow> for Post {
    type Error = Error;

    fn try_from(row: PostRow) -> Result<Self> {
        let body = match row.kind.as_str() {
            "normal" => PostBody::Normal {
                content: row.content.ok_or_else(|| {
                    tracing::error!(post_id = %row.id, "normal post stored without content");
                    Error::InternalServerError
                })?,
                images: row.images,
            },
            "article" => PostBody::Article {
                sections: row.sections.0,
            },
            other => {
                tracing::error!(post_id = %row.id, kind = other, "unknown post kind");
                return Err(Error::InternalServerError);
            }
        };

        Ok(Post {
            id: row.id,
            title: row.title,
            date: row.date,
            body,
        })
    }
}

/// Accepts `YYYY-MM-DD` or any ISO-8601 timestamp and keeps the date portion.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let date_part = value.trim().split('T').next().unwrap_or_default();
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| Error::BadRequest(format!("Invalid date: {value}")))
}

fn deserialize_date<'de, D>(deserializer: D) -> core::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).map_err(|_| serde::de::Error::custom(format!("invalid date `{raw}`")))
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub date: NaiveDate,
    pub body: PostBody,
}

/// Text fields of the multipart create form; images travel separately.
#[derive(Debug, Default, Validate)]
pub struct CreatePostForm {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Date is required"))]
    pub date: String,
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateArticleDto {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub sections: Vec<Section>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePostDto {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    pub content: Option<String>,
}

impl Post {
    /// Replaces the editable text fields, leaving date, kind and media alone.
    pub fn apply_update(&mut self, update: UpdatePostDto) -> Result<()> {
        match &mut self.body {
            PostBody::Normal { content, .. } => {
                if let Some(new_content) = update.content {
                    *content = new_content;
                }
            }
            PostBody::Article { .. } => {
                if update.content.as_deref().is_some_and(|c| !c.trim().is_empty()) {
                    return Err(Error::BadRequest(
                        "Articles have no top-level content; edit their sections instead"
                            .to_string(),
                    ));
                }
            }
        }
        self.title = update.title;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}
