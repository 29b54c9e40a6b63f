use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{Video, VideoSearch};
use crate::errors::AppError;

const SEARCH_URL: &str = "https://www.googleapis.com/youtube/v3/search";
const VIDEOS_URL: &str = "https://www.googleapis.com/youtube/v3/videos";
const DEFAULT_MAX_RESULTS: u32 = 10;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    snippet: Option<Snippet>,
    status: Option<Status>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    channel_title: String,
    #[serde(default)]
    live_broadcast_content: Option<String>,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Status {
    #[serde(default)]
    embeddable: bool,
    privacy_status: Option<String>,
}

impl Thumbnails {
    fn best_url(&self) -> Option<&str> {
        [&self.high, &self.medium, &self.default]
            .into_iter()
            .flatten()
            .filter_map(|t| t.url.as_deref())
            .find(|url| url.starts_with("https://") || url.starts_with("http://"))
    }
}

/// Keeps only videos a candidate can actually watch inline: embeddable,
/// public, not live, with a usable thumbnail and a non-empty title.
fn into_displayable(item: VideoItem) -> Option<Video> {
    let status = item.status?;
    let snippet = item.snippet?;

    if !status.embeddable || status.privacy_status.as_deref() != Some("public") {
        return None;
    }
    if matches!(
        snippet.live_broadcast_content.as_deref(),
        Some("live") | Some("upcoming")
    ) {
        return None;
    }
    let title = snippet.title.trim();
    if title.is_empty() {
        return None;
    }
    let thumbnail = snippet.thumbnails.best_url()?;

    Some(Video::from_youtube_id(
        item.id,
        title,
        snippet.channel_title,
        thumbnail,
    ))
}

fn mock_video(skill: &str) -> Video {
    Video::from_youtube_id(
        "dQw4w9WgXcQ",
        format!("{skill} crash course"),
        "Pathway Mock Channel",
        "https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg",
    )
}

/// YouTube Data API v3 client: `search.list` for candidates, then
/// `videos.list` for embeddability, privacy and live status.
#[derive(Clone)]
pub struct YoutubeVideoSearch {
    client: Client,
    api_key: Option<String>,
    mock: bool,
    max_results: u32,
}

impl YoutubeVideoSearch {
    pub fn new(api_key: Option<String>, mock: bool) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| AppError::Video(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            mock,
            max_results: DEFAULT_MAX_RESULTS,
        })
    }

    async fn search_ids(&self, api_key: &str, skill: &str) -> Result<Vec<String>, reqwest::Error> {
        let query = format!("{skill} tutorial");
        let max_results = self.max_results.to_string();
        let response: SearchResponse = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("part", "snippet"),
                ("type", "video"),
                ("videoEmbeddable", "true"),
                ("maxResults", max_results.as_str()),
                ("q", query.as_str()),
                ("key", api_key),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id)
            .collect())
    }

    async fn fetch_details(
        &self,
        api_key: &str,
        ids: &[String],
    ) -> Result<Vec<VideoItem>, reqwest::Error> {
        let ids = ids.join(",");
        let response: VideosResponse = self
            .client
            .get(VIDEOS_URL)
            .query(&[
                ("part", "snippet,status"),
                ("id", ids.as_str()),
                ("key", api_key),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.items)
    }
}

#[async_trait]
impl VideoSearch for YoutubeVideoSearch {
    async fn search(&self, skill: &str) -> Result<Vec<Video>, AppError> {
        let skill = skill.trim();
        if skill.is_empty() {
            return Ok(vec![]);
        }
        if self.mock {
            return Ok(vec![mock_video(skill)]);
        }
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("No YouTube API key configured; returning no videos for '{skill}'");
            return Ok(vec![]);
        };

        let ids = self.search_ids(api_key, skill).await.map_err(|e| {
            warn!("YouTube search failed for '{skill}': {e}");
            AppError::Video(e.to_string())
        })?;
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let items = self.fetch_details(api_key, &ids).await.map_err(|e| {
            warn!("YouTube video lookup failed for '{skill}': {e}");
            AppError::Video(e.to_string())
        })?;

        let videos: Vec<Video> = items.into_iter().filter_map(into_displayable).collect();
        debug!(
            "YouTube returned {} candidates, {} displayable for '{skill}'",
            ids.len(),
            videos.len()
        );
        Ok(videos)
    }
}
