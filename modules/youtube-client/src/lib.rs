pub mod error;
pub mod transcript;
pub mod types;

pub use error::{Result, YouTubeError};
pub use transcript::CaptionTrack;
pub use types::{
    parse_count, Channel, Comment, CommentSnippet, CommentThread, ListResponse, SearchParams,
    SearchResult, Video, VideoStatistics,
};

use std::time::Duration;

use serde::de::DeserializeOwned;

const BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Timed-text endpoint serving caption tracks. Not quota-metered.
const TIMEDTEXT_URL: &str = "https://www.youtube.com/api/timedtext";

/// Thin REST client over the YouTube Data API.
///
/// The client is key-agnostic: every metered call takes the API key to charge,
/// so callers can rotate keys per request.
pub struct YouTubeClient {
    client: reqwest::Client,
    base_url: String,
    timedtext_url: String,
}

impl YouTubeClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
            timedtext_url: TIMEDTEXT_URL.to_string(),
        })
    }

    /// Point the client at a different API root (used against local fakes).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timedtext_url(mut self, url: &str) -> Self {
        self.timedtext_url = url.to_string();
        self
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        api_key: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let resp = self
            .client
            .get(&url)
            .query(&[("key", api_key)])
            .query(query)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            let err = YouTubeError::Api {
                status: status.as_u16(),
                message,
            };
            if err.is_quota_exceeded() {
                tracing::warn!(endpoint, "youtube: provider reports key quota exceeded");
            }
            return Err(err);
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// `search.list` restricted to videos. Returns video ids in provider ranking order.
    pub async fn search_videos(&self, api_key: &str, params: &SearchParams) -> Result<Vec<String>> {
        tracing::debug!(q = params.q.as_str(), max_results = params.max_results, "youtube: search");

        let mut query = vec![
            ("part", "snippet".to_string()),
            ("type", "video".to_string()),
            ("q", params.q.clone()),
            ("maxResults", params.max_results.to_string()),
            ("order", params.order.clone()),
        ];
        if let Some(ref after) = params.published_after {
            query.push(("publishedAfter", after.clone()));
        }

        let resp: ListResponse<SearchResult> = self.get("search", api_key, &query).await?;
        Ok(resp
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id)
            .collect())
    }

    /// `videos.list` for a single id. `None` when the video is gone or private.
    pub async fn video(&self, api_key: &str, video_id: &str) -> Result<Option<Video>> {
        let query = [
            ("part", "snippet,statistics".to_string()),
            ("id", video_id.to_string()),
        ];
        let resp: ListResponse<Video> = self.get("videos", api_key, &query).await?;
        Ok(resp.items.into_iter().next())
    }

    /// `channels.list` for a single id.
    pub async fn channel(&self, api_key: &str, channel_id: &str) -> Result<Option<Channel>> {
        let query = [
            ("part", "snippet,statistics".to_string()),
            ("id", channel_id.to_string()),
        ];
        let resp: ListResponse<Channel> = self.get("channels", api_key, &query).await?;
        Ok(resp.items.into_iter().next())
    }

    /// One page of `commentThreads.list` for a video.
    pub async fn comment_threads(
        &self,
        api_key: &str,
        video_id: &str,
        page_token: Option<&str>,
        max_results: u32,
    ) -> Result<ListResponse<CommentThread>> {
        let mut query = vec![
            ("part", "snippet".to_string()),
            ("videoId", video_id.to_string()),
            ("maxResults", max_results.to_string()),
            ("textFormat", "plainText".to_string()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token.to_string()));
        }
        self.get("commentThreads", api_key, &query).await
    }

    /// One page of `comments.list` replies under a top-level comment.
    pub async fn replies(
        &self,
        api_key: &str,
        parent_id: &str,
        page_token: Option<&str>,
        max_results: u32,
    ) -> Result<ListResponse<Comment>> {
        let mut query = vec![
            ("part", "snippet".to_string()),
            ("parentId", parent_id.to_string()),
            ("maxResults", max_results.to_string()),
            ("textFormat", "plainText".to_string()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token.to_string()));
        }
        self.get("comments", api_key, &query).await
    }

    /// Caption tracks a video offers, manual and speech-recognized alike.
    pub async fn caption_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>> {
        let xml = self
            .timedtext(&[("type", "list"), ("v", video_id)])
            .await?
            .unwrap_or_default();
        Ok(transcript::parse_track_list(&xml))
    }

    /// Flattened text of the best caption track for a video.
    ///
    /// Prefers a manual track in `lang`, then the speech-recognized one, then
    /// any other language. `None` when the video has no usable track.
    pub async fn transcript(&self, video_id: &str, lang: &str) -> Result<Option<String>> {
        let tracks = self.caption_tracks(video_id).await?;
        let Some(track) = transcript::pick_track(&tracks, lang) else {
            return Ok(None);
        };
        tracing::debug!(
            video_id,
            lang_code = track.lang_code.as_str(),
            generated = track.is_generated(),
            "youtube: caption track selected"
        );

        let mut query = vec![("v", video_id), ("lang", track.lang_code.as_str())];
        if track.is_generated() {
            query.push(("kind", "asr"));
        }
        if !track.name.is_empty() {
            query.push(("name", track.name.as_str()));
        }
        Ok(self.timedtext(&query).await?.as_deref().and_then(transcript::flatten))
    }

    /// GET against the timed-text endpoint. `None` on 404.
    async fn timedtext(&self, query: &[(&str, &str)]) -> Result<Option<String>> {
        let resp = self.client.get(&self.timedtext_url).query(query).send().await?;

        let status = resp.status();
        if status.as_u16() == 404 {
            return Ok(None);
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(YouTubeError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(Some(resp.text().await?))
    }
}
