//! Video Search: finds learning videos for a skill.
//!
//! Default: `YoutubeVideoSearch` (YouTube Data API v3).
//! Missing credentials degrade to an empty result, never an error.
//! Mock mode returns one synthetic video per skill without any network call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

pub mod handlers;
pub mod youtube;

pub use youtube::YoutubeVideoSearch;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub channel_title: String,
    pub thumbnail_url: String,
    pub url: String,
    pub embed_url: String,
}

impl Video {
    pub fn from_youtube_id(
        id: impl Into<String>,
        title: impl Into<String>,
        channel_title: impl Into<String>,
        thumbnail_url: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            url: format!("https://www.youtube.com/watch?v={id}"),
            embed_url: format!("https://www.youtube.com/embed/{id}"),
            title: title.into(),
            channel_title: channel_title.into(),
            thumbnail_url: thumbnail_url.into(),
            id,
        }
    }
}

/// Carried in `AppState` as `Arc<dyn VideoSearch>`.
#[async_trait]
pub trait VideoSearch: Send + Sync {
    async fn search(&self, skill: &str) -> Result<Vec<Video>, AppError>;
}
