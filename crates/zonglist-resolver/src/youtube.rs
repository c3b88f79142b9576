//! HTTP client for the YouTube Data API v3.

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use zonglist_core::TrackInfo;

use crate::{MetadataResolver, ResolverError, normalize_duration};

/// Default API base URL.
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Default number of search results.
pub const DEFAULT_MAX_RESULTS: u32 = 10;

/// Default timeout for API requests.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Music video category.
const MUSIC_CATEGORY_ID: &str = "10";

/// YouTube search client.
///
/// Search is two requests: `/search` for candidates, then `/videos` for
/// their durations. Results are joined by video id.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    client: Client,
    api_base: String,
    api_key: String,
    max_results: u32,
}

impl YouTubeClient {
    /// Create a builder for configuring the client.
    #[must_use]
    pub fn builder() -> YouTubeClientBuilder {
        YouTubeClientBuilder::default()
    }

    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    async fn get<T>(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<T, ResolverError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}/{endpoint}", self.api_base);
        tracing::debug!(%url, "YouTube API request");
        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn durations(&self, ids: &[&str]) -> Result<HashMap<String, String>, ResolverError> {
        let joined = ids.join(",");
        let details: VideoList = self
            .get("videos", &[("part", "contentDetails"), ("id", joined.as_str())])
            .await?;
        Ok(details
            .items
            .into_iter()
            .filter_map(|item| {
                let duration = display_duration(&item.id, &item.content_details?.duration);
                Some((item.id, duration))
            })
            .collect())
    }
}

#[async_trait]
impl MetadataResolver for YouTubeClient {
    async fn search(&self, query: &str) -> Result<Vec<TrackInfo>, ResolverError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let max_results = self.max_results.to_string();
        let found: SearchList = self
            .get(
                "search",
                &[
                    ("part", "snippet"),
                    ("q", query),
                    ("type", "video"),
                    ("videoCategoryId", MUSIC_CATEGORY_ID),
                    ("maxResults", max_results.as_str()),
                ],
            )
            .await?;

        let hits: Vec<(String, Snippet)> = found
            .items
            .into_iter()
            .filter_map(|item| Some((item.id.video_id?, item.snippet)))
            .collect();
        if hits.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<&str> = hits.iter().map(|(id, _)| id.as_str()).collect();
        let mut durations = self.durations(&ids).await?;

        let results: Vec<TrackInfo> = hits
            .into_iter()
            .map(|(video_id, snippet)| {
                let duration = durations.remove(&video_id).unwrap_or_default();
                snippet.into_track(video_id, duration)
            })
            .collect();
        tracing::info!(query, results = results.len(), "YouTube search");
        Ok(results)
    }

    async fn lookup(&self, video_id: &str) -> Result<Option<TrackInfo>, ResolverError> {
        let list: VideoList = self
            .get("videos", &[("part", "snippet,contentDetails"), ("id", video_id)])
            .await?;
        let Some(item) = list.items.into_iter().next() else {
            return Ok(None);
        };
        let snippet = item
            .snippet
            .ok_or_else(|| ResolverError::InvalidResponse(format!("video {video_id} has no snippet")))?;
        let duration = item
            .content_details
            .map(|d| display_duration(&item.id, &d.duration))
            .unwrap_or_default();
        Ok(Some(snippet.into_track(item.id, duration)))
    }
}

/// Builder for [`YouTubeClient`].
#[derive(Debug, Clone)]
pub struct YouTubeClientBuilder {
    client: Option<Client>,
    api_base: String,
    api_key: Option<String>,
    max_results: u32,
    timeout: Duration,
}

impl Default for YouTubeClientBuilder {
    fn default() -> Self {
        Self {
            client: None,
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            max_results: DEFAULT_MAX_RESULTS,
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl YouTubeClientBuilder {
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Override the API base URL (no trailing slash).
    #[must_use]
    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub const fn max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Share an existing HTTP client. The timeout setting is then ignored.
    #[must_use]
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    /// Returns error if no API key is set or the HTTP client cannot be built.
    pub fn build(self) -> Result<YouTubeClient, ResolverError> {
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(ResolverError::MissingApiKey)?;
        let client = match self.client {
            Some(client) => client,
            None => Client::builder().timeout(self.timeout).build()?,
        };
        Ok(YouTubeClient {
            client,
            api_base: self.api_base,
            api_key,
            max_results: self.max_results,
        })
    }
}

async fn check_status(response: Response) -> Result<Response, ResolverError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|b| b.error.message)
        .unwrap_or(body);
    tracing::error!(status = status.as_u16(), %message, "YouTube API error");
    Err(ResolverError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Durations that do not parse (live streams report `P0D`) display as empty.
fn display_duration(video_id: &str, iso: &str) -> String {
    normalize_duration(iso).unwrap_or_else(|e| {
        tracing::warn!(video_id, error = %e, "Unparseable duration");
        String::new()
    })
}

#[derive(Debug, Deserialize)]
struct SearchList {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    channel_title: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

impl Snippet {
    fn into_track(self, video_id: String, duration: String) -> TrackInfo {
        let thumbnail = self
            .thumbnails
            .medium
            .or(self.thumbnails.high)
            .or(self.thumbnails.default)
            .map(|t| t.url)
            .unwrap_or_default();
        TrackInfo {
            video_id,
            title: self.title,
            artist: self.channel_title,
            thumbnail,
            duration,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    default: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
struct VideoList {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    snippet: Option<Snippet>,
    content_details: Option<ContentDetails>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_api_key() {
        assert!(matches!(
            YouTubeClient::builder().build(),
            Err(ResolverError::MissingApiKey)
        ));
        assert!(matches!(
            YouTubeClient::builder().api_key("  ").build(),
            Err(ResolverError::MissingApiKey)
        ));
    }

    #[test]
    fn test_builder_trims_base() {
        let client = YouTubeClient::builder()
            .api_key("k")
            .api_base("http://localhost:9/yt/")
            .build()
            .unwrap();
        assert_eq!(client.api_base(), "http://localhost:9/yt");
    }

    #[test]
    fn test_thumbnail_fallback() {
        let snippet: Snippet = serde_json::from_value(serde_json::json!({
            "title": "t",
            "channelTitle": "c",
            "thumbnails": { "default": { "url": "d.jpg" } }
        }))
        .unwrap();
        assert_eq!(snippet.into_track("v".into(), String::new()).thumbnail, "d.jpg");
    }

    #[test]
    fn test_live_duration_displays_empty() {
        assert_eq!(display_duration("v", "P0D"), "");
        assert_eq!(display_duration("v", "PT3M7S"), "3:07");
    }
}
