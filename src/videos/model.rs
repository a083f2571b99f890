use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: Uuid,
    pub video_file: String,
    pub thumbnail: String,
    pub owner_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub duration: String,
    pub views: i64,
    pub is_published: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A validated video ready to insert. Views start at 0 and the video is
/// unpublished.
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub video_file: String,
    pub thumbnail: String,
    pub owner_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub duration: String,
    pub views: i64,
    pub is_published: bool,
}

impl NewVideo {
    pub fn new(
        video_file: &str,
        thumbnail: &str,
        owner_id: Option<Uuid>,
        title: &str,
        description: &str,
        duration: &str,
    ) -> Result<Self, ApiError> {
        let required = [
            ("videoFile", video_file),
            ("thumbnail", thumbnail),
            ("title", title),
            ("description", description),
            ("duration", duration),
        ];
        if let Some((name, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(ApiError::Validation(format!("{name} is required")));
        }
        Ok(Self {
            video_file: video_file.trim().to_string(),
            thumbnail: thumbnail.trim().to_string(),
            owner_id,
            title: title.trim().to_string(),
            description: description.trim().to_string(),
            duration: duration.trim().to_string(),
            views: 0,
            is_published: false,
        })
    }
}
