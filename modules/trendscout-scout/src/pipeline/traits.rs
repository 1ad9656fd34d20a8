// Trait boundaries between the pipeline and the outside world.
//
// - VideoPlatform: quota-metered API, every call takes the key to charge
// - BodyResolver: unmetered body/transcript lookup
// - TextNormalizer: language normalization applied to bodies
// - PostSource: the forum platform, an opaque producer of enriched posts

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;

use trendscout_common::types::{Body, EnrichedItem};

/// Parameters of the single search call that seeds an enrichment run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub max_results: u32,
    /// Provider ordering, e.g. "viewCount".
    pub order: String,
    /// RFC 3339 lower bound on publish time.
    pub published_after: Option<String>,
}

/// Item metadata returned by the item lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRecord {
    pub id: String,
    pub title: String,
    pub url: String,
    pub metrics: BTreeMap<String, i64>,
    pub published_at: String,
    pub channel_id: String,
    pub channel_title: String,
}

/// Author metadata returned by the channel lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRecord {
    pub creation_date: String,
    pub followers: i64,
}

/// A single comment as returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawComment {
    pub id: String,
    pub author: String,
    pub text: String,
    pub published_at: String,
    pub score: i64,
}

/// A top-level comment thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadRecord {
    pub id: String,
    pub comment: RawComment,
    pub reply_count: u64,
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

#[async_trait]
pub trait VideoPlatform: Send + Sync {
    /// Candidate ids in provider ranking order.
    async fn search(&self, api_key: &str, request: &SearchRequest) -> Result<Vec<String>>;

    /// `None` when the item no longer exists.
    async fn video(&self, api_key: &str, video_id: &str) -> Result<Option<VideoRecord>>;

    /// `None` when the channel no longer exists.
    async fn channel(&self, api_key: &str, channel_id: &str) -> Result<Option<ChannelRecord>>;

    async fn comment_threads(
        &self,
        api_key: &str,
        video_id: &str,
        page_token: Option<&str>,
        page_size: u32,
    ) -> Result<Page<ThreadRecord>>;

    async fn replies(
        &self,
        api_key: &str,
        parent_id: &str,
        page_token: Option<&str>,
        page_size: u32,
    ) -> Result<Page<RawComment>>;
}

/// Resolves an item's primary body. Never charges quota; failures resolve to
/// [`Body::Unavailable`].
#[async_trait]
pub trait BodyResolver: Send + Sync {
    async fn resolve(&self, item_id: &str) -> Body;
}

/// Detects language and translates into the canonical language.
///
/// Infallible: implementations fall back to the input text.
#[async_trait]
pub trait TextNormalizer: Send + Sync {
    async fn normalize(&self, text: &str) -> String;
}

/// Leaves text untouched.
pub struct IdentityNormalizer;

#[async_trait]
impl TextNormalizer for IdentityNormalizer {
    async fn normalize(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Machine translation into a target language (ISO 639-1 code).
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target: &str) -> Result<String>;
}

#[async_trait]
pub trait PostSource: Send + Sync {
    /// Community names matching a query, best match first.
    async fn search_communities(&self, query: &str, limit: u32) -> Result<Vec<String>>;

    /// Currently popular posts with a body, deduplicated by URL.
    async fn hot_posts(&self, communities: &[String], limit_per_community: u32)
        -> Result<Vec<EnrichedItem>>;

    /// Posts about a topic across communities, at most `limit`.
    async fn posts_for_topic(
        &self,
        topic: &str,
        communities: &[String],
        limit: usize,
    ) -> Result<Vec<EnrichedItem>>;
}
