// Binds the YouTube client to the pipeline traits.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, warn};

use trendscout_common::types::Body;
use youtube_client::{parse_count, Comment, SearchParams, Video, YouTubeClient};

use crate::pipeline::traits::{
    BodyResolver, ChannelRecord, IdentityNormalizer, Page, RawComment, SearchRequest,
    TextNormalizer, ThreadRecord, VideoPlatform, VideoRecord,
};

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

#[async_trait]
impl VideoPlatform for YouTubeClient {
    async fn search(&self, api_key: &str, request: &SearchRequest) -> Result<Vec<String>> {
        let params = SearchParams {
            q: request.query.clone(),
            max_results: request.max_results,
            order: request.order.clone(),
            published_after: request.published_after.clone(),
        };
        Ok(self.search_videos(api_key, &params).await?)
    }

    async fn video(&self, api_key: &str, video_id: &str) -> Result<Option<VideoRecord>> {
        Ok(YouTubeClient::video(self, api_key, video_id).await?.map(video_record))
    }

    async fn channel(&self, api_key: &str, channel_id: &str) -> Result<Option<ChannelRecord>> {
        let channel = YouTubeClient::channel(self, api_key, channel_id).await?;
        Ok(channel.map(|c| ChannelRecord {
            creation_date: c.snippet.published_at,
            followers: parse_count(c.statistics.subscriber_count.as_deref()),
        }))
    }

    async fn comment_threads(
        &self,
        api_key: &str,
        video_id: &str,
        page_token: Option<&str>,
        page_size: u32,
    ) -> Result<Page<ThreadRecord>> {
        let page = YouTubeClient::comment_threads(self, api_key, video_id, page_token, page_size).await?;
        Ok(Page {
            items: page
                .items
                .into_iter()
                .map(|t| ThreadRecord {
                    id: t.id,
                    reply_count: t.snippet.total_reply_count,
                    comment: raw_comment(t.snippet.top_level_comment),
                })
                .collect(),
            next_page_token: page.next_page_token,
        })
    }

    async fn replies(
        &self,
        api_key: &str,
        parent_id: &str,
        page_token: Option<&str>,
        page_size: u32,
    ) -> Result<Page<RawComment>> {
        let page = YouTubeClient::replies(self, api_key, parent_id, page_token, page_size).await?;
        Ok(Page {
            items: page.items.into_iter().map(raw_comment).collect(),
            next_page_token: page.next_page_token,
        })
    }
}

fn video_record(video: Video) -> VideoRecord {
    let stats = &video.statistics;
    let metrics = BTreeMap::from([
        ("views".to_string(), parse_count(stats.view_count.as_deref())),
        ("likes".to_string(), parse_count(stats.like_count.as_deref())),
        ("comments".to_string(), parse_count(stats.comment_count.as_deref())),
    ]);
    VideoRecord {
        url: format!("{WATCH_URL}{}", video.id),
        id: video.id,
        title: video.snippet.title,
        metrics,
        published_at: video.snippet.published_at,
        channel_id: video.snippet.channel_id,
        channel_title: video.snippet.channel_title,
    }
}

fn raw_comment(comment: Comment) -> RawComment {
    RawComment {
        text: comment.snippet.text().to_string(),
        id: comment.id,
        author: comment.snippet.author_display_name,
        published_at: comment.snippet.published_at,
        score: comment.snippet.like_count,
    }
}

/// Resolves a video's body from its caption track.
pub struct TranscriptResolver {
    client: Arc<YouTubeClient>,
    lang: String,
    normalizer: Arc<dyn TextNormalizer>,
}

impl TranscriptResolver {
    pub fn new(client: Arc<YouTubeClient>) -> Self {
        Self {
            client,
            lang: "en".to_string(),
            normalizer: Arc::new(IdentityNormalizer),
        }
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    pub fn with_normalizer(mut self, normalizer: Arc<dyn TextNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }
}

#[async_trait]
impl BodyResolver for TranscriptResolver {
    async fn resolve(&self, item_id: &str) -> Body {
        match self.client.transcript(item_id, &self.lang).await {
            Ok(Some(text)) => Body::from_text(self.normalizer.normalize(&text).await),
            Ok(None) => {
                debug!(video_id = item_id, lang = self.lang.as_str(), "No caption track");
                Body::Unavailable
            }
            Err(e) => {
                warn!(video_id = item_id, error = %e, "Transcript fetch failed");
                Body::Unavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_maps_to_record_with_parsed_metrics() {
        let video: Video = serde_json::from_value(serde_json::json!({
            "id": "abc123",
            "snippet": {
                "title": "Budget explained",
                "publishedAt": "2024-04-20T10:00:00Z",
                "channelId": "UC1",
                "channelTitle": "Civic Desk"
            },
            "statistics": {"viewCount": "1500", "likeCount": "40"}
        }))
        .unwrap();

        let record = video_record(video);
        assert_eq!(record.url, "https://www.youtube.com/watch?v=abc123");
        assert_eq!(record.metrics["views"], 1500);
        assert_eq!(record.metrics["likes"], 40);
        assert_eq!(record.metrics["comments"], 0);
        assert_eq!(record.channel_title, "Civic Desk");
    }

    #[test]
    fn comment_prefers_original_text() {
        let comment: Comment = serde_json::from_value(serde_json::json!({
            "id": "c1",
            "snippet": {
                "authorDisplayName": "viewer",
                "textDisplay": "<b>bold</b> take",
                "textOriginal": "bold take",
                "publishedAt": "2024-04-21T08:00:00Z",
                "likeCount": 3
            }
        }))
        .unwrap();

        let raw = raw_comment(comment);
        assert_eq!(raw.text, "bold take");
        assert_eq!(raw.score, 3);
        assert_eq!(raw.author, "viewer");
    }
}
