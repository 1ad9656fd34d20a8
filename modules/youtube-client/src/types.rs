use serde::{Deserialize, Serialize};

// --- Generic list envelope ---

/// Paged list response shared by every `*.list` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

// --- search.list ---

/// Query parameters for `search.list` restricted to videos.
#[derive(Debug, Clone, Serialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(rename = "maxResults")]
    pub max_results: u32,
    /// "viewCount", "relevance", "date", "rating".
    pub order: String,
    /// RFC 3339 lower bound on the publish date.
    #[serde(rename = "publishedAfter", skip_serializing_if = "Option::is_none")]
    pub published_after: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    pub id: SearchResultId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResultId {
    pub kind: Option<String>,
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
}

// --- videos.list ---

#[derive(Debug, Clone, Deserialize)]
pub struct Video {
    pub id: String,
    pub snippet: VideoSnippet,
    #[serde(default)]
    pub statistics: VideoStatistics,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoSnippet {
    pub title: String,
    #[serde(rename = "publishedAt")]
    pub published_at: String,
    #[serde(rename = "channelId")]
    pub channel_id: String,
    #[serde(rename = "channelTitle", default)]
    pub channel_title: String,
}

/// Counters arrive as decimal strings and may be hidden by the uploader.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoStatistics {
    #[serde(rename = "viewCount")]
    pub view_count: Option<String>,
    #[serde(rename = "likeCount")]
    pub like_count: Option<String>,
    #[serde(rename = "commentCount")]
    pub comment_count: Option<String>,
}

// --- channels.list ---

#[derive(Debug, Clone, Deserialize)]
pub struct Channel {
    pub id: String,
    pub snippet: ChannelSnippet,
    #[serde(default)]
    pub statistics: ChannelStatistics,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelSnippet {
    pub title: String,
    #[serde(rename = "publishedAt")]
    pub published_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelStatistics {
    #[serde(rename = "subscriberCount")]
    pub subscriber_count: Option<String>,
}

// --- commentThreads.list / comments.list ---

#[derive(Debug, Clone, Deserialize)]
pub struct CommentThread {
    pub id: String,
    pub snippet: CommentThreadSnippet,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentThreadSnippet {
    #[serde(rename = "topLevelComment")]
    pub top_level_comment: Comment,
    #[serde(rename = "totalReplyCount", default)]
    pub total_reply_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    pub id: String,
    pub snippet: CommentSnippet,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentSnippet {
    #[serde(rename = "authorDisplayName", default)]
    pub author_display_name: String,
    #[serde(rename = "textDisplay", default)]
    pub text_display: String,
    #[serde(rename = "textOriginal")]
    pub text_original: Option<String>,
    #[serde(rename = "publishedAt", default)]
    pub published_at: String,
    #[serde(rename = "likeCount", default)]
    pub like_count: i64,
}

impl CommentSnippet {
    /// Plain text when the API returned it, rendered text otherwise.
    pub fn text(&self) -> &str {
        self.text_original.as_deref().unwrap_or(&self.text_display)
    }
}

/// Parse one of the decimal-string counters the API returns.
pub fn parse_count(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.parse().ok()).unwrap_or(0)
}
