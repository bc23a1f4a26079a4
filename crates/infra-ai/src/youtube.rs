// YouTube Data API v3 VideoSearch Implementation

use async_trait::async_trait;
use serde::Deserialize;
use solace_core::domain::{Language, Video};
use solace_core::port::{VideoSearch, VideoSearchError};
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
const DESCRIPTION_LIMIT: usize = 200;

pub struct YouTubeClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl YouTubeClient {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self, VideoSearchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VideoSearchError::Http(e.to_string()))?;

        let api_key = api_key.filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            warn!("YOUTUBE_API_KEY is not set, curated fallback videos will be served");
        }

        Ok(Self {
            http,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the client at another API root (tests, proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, VideoSearchError> {
        let api_key = self.api_key.as_deref().ok_or(VideoSearchError::NotConfigured)?;

        let response = self
            .http
            .get(format!("{}/{}", self.base_url, path))
            .query(query)
            .query(&[("key", api_key)])
            .send()
            .await
            .map_err(|e| VideoSearchError::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| VideoSearchError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(classify_error(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| VideoSearchError::Decode(e.to_string()))
    }
}

/// Map a failed API response to a search error; quota exhaustion is its own case
pub(crate) fn classify_error(status: u16, body: &str) -> VideoSearchError {
    if status == 403 && (body.contains("quotaExceeded") || body.contains("dailyLimitExceeded")) {
        return VideoSearchError::QuotaExceeded;
    }
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect());
    VideoSearchError::Http(format!("{}: {}", status, message))
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

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
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    snippet: Snippet,
    #[serde(default)]
    statistics: Statistics,
    content_details: Option<ContentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    channel_title: String,
    published_at: Option<String>,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

// The API encodes counters as strings
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    view_count: Option<String>,
    like_count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: String,
}

fn truncate_description(description: &str) -> String {
    if description.chars().count() > DESCRIPTION_LIMIT {
        let head: String = description.chars().take(DESCRIPTION_LIMIT).collect();
        format!("{}...", head)
    } else {
        description.to_string()
    }
}

fn parse_count(value: Option<&str>) -> u64 {
    value.and_then(|v| v.parse().ok()).unwrap_or(0)
}

impl VideoItem {
    fn into_video(self) -> Video {
        let thumbnail = self
            .snippet
            .thumbnails
            .medium
            .or(self.snippet.thumbnails.default)
            .map(|t| t.url)
            .unwrap_or_else(|| format!("https://img.youtube.com/vi/{}/mqdefault.jpg", self.id));

        Video {
            url: Video::watch_url(&self.id),
            title: self.snippet.title,
            description: truncate_description(&self.snippet.description),
            thumbnail,
            channel: self.snippet.channel_title,
            published_at: self.snippet.published_at,
            duration: self
                .content_details
                .map(|d| d.duration)
                .unwrap_or_else(|| "PT0S".to_string()),
            view_count: parse_count(self.statistics.view_count.as_deref()),
            like_count: parse_count(self.statistics.like_count.as_deref()),
            id: self.id,
            formatted_duration: None,
        }
    }
}

#[async_trait]
impl VideoSearch for YouTubeClient {
    async fn search(
        &self,
        query: &str,
        max_results: u32,
        language: Language,
    ) -> Result<Vec<Video>, VideoSearchError> {
        let max_results = max_results.to_string();
        let search: SearchResponse = self
            .get(
                "search",
                &[
                    ("q", query),
                    ("part", "id,snippet"),
                    ("maxResults", max_results.as_str()),
                    ("type", "video"),
                    ("videoDuration", "medium"),
                    ("relevanceLanguage", language.as_str()),
                    ("order", "relevance"),
                ],
            )
            .await?;

        let ids: Vec<String> = search
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id)
            .collect();
        if ids.is_empty() {
            debug!(query = %query, "Video search returned no results");
            return Ok(Vec::new());
        }

        // One details call for the whole page instead of one per video
        let joined = ids.join(",");
        let details: VideosResponse = self
            .get(
                "videos",
                &[
                    ("part", "snippet,statistics,contentDetails"),
                    ("id", joined.as_str()),
                ],
            )
            .await?;

        let videos: Vec<Video> = details.items.into_iter().map(VideoItem::into_video).collect();
        debug!(query = %query, found = videos.len(), "Video search completed");
        Ok(videos)
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}
