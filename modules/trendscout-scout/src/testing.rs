// Test mocks for the enrichment pipeline and run orchestration.
//
// Mocks matching the trait boundaries:
// - MockPlatform (VideoPlatform): HashMap-based, records every metered call
// - MockBodies (BodyResolver): registered ids have a body, the rest do not
// - MockPostSource (PostSource): canned forum results
// - ManualClock (Clock): settable "today"
//
// Plus builders for records and a selector over a fixed clock.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::NaiveDate;

use trendscout_common::types::{AuthorInfo, Body, EnrichedItem};

use crate::pipeline::traits::{
    BodyResolver, ChannelRecord, Page, PostSource, RawComment, SearchRequest, ThreadRecord,
    VideoPlatform, VideoRecord,
};
use crate::scheduling::{Clock, CredentialSelector, Operation, QuotaLedger};

// ---------------------------------------------------------------------------
// ManualClock
// ---------------------------------------------------------------------------

pub struct ManualClock {
    today: Mutex<NaiveDate>,
}

impl ManualClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: Mutex::new(today),
        }
    }

    pub fn set(&self, today: NaiveDate) {
        *self.today.lock().unwrap() = today;
    }
}

impl Clock for ManualClock {
    fn today(&self) -> NaiveDate {
        *self.today.lock().unwrap()
    }
}

/// Selector over `keys` credentials ("key-0", "key-1", ...) on a fixed day.
pub fn test_selector(keys: usize, daily_quota: u64) -> Arc<CredentialSelector> {
    let clock = Arc::new(ManualClock::new(
        NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date"),
    ));
    let keys = (0..keys).map(|i| format!("key-{i}")).collect();
    Arc::new(CredentialSelector::new(Arc::new(QuotaLedger::with_clock(
        keys,
        daily_quota,
        clock,
    ))))
}

// ---------------------------------------------------------------------------
// MockPlatform
// ---------------------------------------------------------------------------

/// A metered call as the platform saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCall {
    pub operation: Operation,
    /// Query, video id, channel id or parent comment id.
    pub target: String,
    pub api_key: String,
}

/// HashMap-based video platform. Unregistered lookups return nothing.
/// Builder pattern: `.on_search()`, `.on_video()`, `.on_threads()`, ...
pub struct MockPlatform {
    searches: HashMap<String, Vec<String>>,
    videos: HashMap<String, VideoRecord>,
    channels: HashMap<String, ChannelRecord>,
    threads: HashMap<String, Vec<Vec<ThreadRecord>>>,
    replies: HashMap<String, Vec<Vec<RawComment>>>,
    failing: HashSet<(Operation, String)>,
    failing_pages: HashSet<(Operation, String, usize)>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<ApiCall>>,
    search_requests: Mutex<Vec<SearchRequest>>,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            searches: HashMap::new(),
            videos: HashMap::new(),
            channels: HashMap::new(),
            threads: HashMap::new(),
            replies: HashMap::new(),
            failing: HashSet::new(),
            failing_pages: HashSet::new(),
            delays: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            search_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn on_search(mut self, query: &str, ids: &[&str]) -> Self {
        self.searches
            .insert(query.to_string(), ids.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn on_video(mut self, video: VideoRecord) -> Self {
        self.videos.insert(video.id.clone(), video);
        self
    }

    pub fn on_channel(mut self, channel_id: &str, channel: ChannelRecord) -> Self {
        self.channels.insert(channel_id.to_string(), channel);
        self
    }

    /// Thread listing for a video, one inner vec per page.
    pub fn on_threads(mut self, video_id: &str, pages: Vec<Vec<ThreadRecord>>) -> Self {
        self.threads.insert(video_id.to_string(), pages);
        self
    }

    /// Reply listing for a thread, one inner vec per page.
    pub fn on_replies(mut self, parent_id: &str, pages: Vec<Vec<RawComment>>) -> Self {
        self.replies.insert(parent_id.to_string(), pages);
        self
    }

    /// Every call of `operation` on `target` errors.
    pub fn failing(mut self, operation: Operation, target: &str) -> Self {
        self.failing.insert((operation, target.to_string()));
        self
    }

    /// Only page `page` (0-based) of a listing errors.
    pub fn failing_page(mut self, operation: Operation, target: &str, page: usize) -> Self {
        self.failing_pages
            .insert((operation, target.to_string(), page));
        self
    }

    /// Delay the item lookup of `video_id`.
    pub fn with_delay(mut self, video_id: &str, delay: Duration) -> Self {
        self.delays.insert(video_id.to_string(), delay);
        self
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, operation: Operation) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    /// Calls whose target is `target`.
    pub fn calls_for(&self, target: &str) -> Vec<ApiCall> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.target == target)
            .cloned()
            .collect()
    }

    pub fn last_search(&self) -> Option<SearchRequest> {
        self.search_requests.lock().unwrap().last().cloned()
    }

    fn record(&self, operation: Operation, target: &str, api_key: &str) -> Result<()> {
        self.calls.lock().unwrap().push(ApiCall {
            operation,
            target: target.to_string(),
            api_key: api_key.to_string(),
        });
        if self.failing.contains(&(operation, target.to_string())) {
            bail!("MockPlatform: {operation} failed for {target}");
        }
        Ok(())
    }

    fn page<T: Clone>(
        &self,
        operation: Operation,
        target: &str,
        pages: Option<&Vec<Vec<T>>>,
        page_token: Option<&str>,
    ) -> Result<Page<T>> {
        let index: usize = match page_token {
            Some(token) => token.parse()?,
            None => 0,
        };
        if self
            .failing_pages
            .contains(&(operation, target.to_string(), index))
        {
            bail!("MockPlatform: {operation} page {index} failed for {target}");
        }

        let Some(pages) = pages else {
            return Ok(Page {
                items: Vec::new(),
                next_page_token: None,
            });
        };
        let items = pages.get(index).cloned().unwrap_or_default();
        let next_page_token = (index + 1 < pages.len()).then(|| (index + 1).to_string());
        Ok(Page {
            items,
            next_page_token,
        })
    }
}

#[async_trait]
impl VideoPlatform for MockPlatform {
    async fn search(&self, api_key: &str, request: &SearchRequest) -> Result<Vec<String>> {
        self.search_requests.lock().unwrap().push(request.clone());
        self.record(Operation::Search, &request.query, api_key)?;
        Ok(self.searches.get(&request.query).cloned().unwrap_or_default())
    }

    async fn video(&self, api_key: &str, video_id: &str) -> Result<Option<VideoRecord>> {
        self.record(Operation::Videos, video_id, api_key)?;
        if let Some(delay) = self.delays.get(video_id) {
            tokio::time::sleep(*delay).await;
        }
        Ok(self.videos.get(video_id).cloned())
    }

    async fn channel(&self, api_key: &str, channel_id: &str) -> Result<Option<ChannelRecord>> {
        self.record(Operation::Channels, channel_id, api_key)?;
        Ok(self.channels.get(channel_id).cloned())
    }

    async fn comment_threads(
        &self,
        api_key: &str,
        video_id: &str,
        page_token: Option<&str>,
        _page_size: u32,
    ) -> Result<Page<ThreadRecord>> {
        self.record(Operation::CommentThreads, video_id, api_key)?;
        self.page(
            Operation::CommentThreads,
            video_id,
            self.threads.get(video_id),
            page_token,
        )
    }

    async fn replies(
        &self,
        api_key: &str,
        parent_id: &str,
        page_token: Option<&str>,
        _page_size: u32,
    ) -> Result<Page<RawComment>> {
        self.record(Operation::Comments, parent_id, api_key)?;
        self.page(
            Operation::Comments,
            parent_id,
            self.replies.get(parent_id),
            page_token,
        )
    }
}

// ---------------------------------------------------------------------------
// MockBodies
// ---------------------------------------------------------------------------

/// Registered ids resolve to their text; everything else is unavailable.
#[derive(Default)]
pub struct MockBodies {
    bodies: HashMap<String, String>,
    resolved: Mutex<Vec<String>>,
}

impl MockBodies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, id: &str, text: &str) -> Self {
        self.bodies.insert(id.to_string(), text.to_string());
        self
    }

    pub fn resolved(&self) -> Vec<String> {
        self.resolved.lock().unwrap().clone()
    }
}

#[async_trait]
impl BodyResolver for MockBodies {
    async fn resolve(&self, item_id: &str) -> Body {
        self.resolved.lock().unwrap().push(item_id.to_string());
        match self.bodies.get(item_id) {
            Some(text) => Body::from_text(text.clone()),
            None => Body::Unavailable,
        }
    }
}

// ---------------------------------------------------------------------------
// MockPostSource
// ---------------------------------------------------------------------------

/// Canned forum results. Unregistered queries and topics return nothing.
#[derive(Default)]
pub struct MockPostSource {
    communities: HashMap<String, Vec<String>>,
    hot: HashMap<String, Vec<EnrichedItem>>,
    by_topic: HashMap<String, Vec<EnrichedItem>>,
    fail_community_search: bool,
    topic_requests: Mutex<Vec<String>>,
}

impl MockPostSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_communities(mut self, query: &str, communities: &[&str]) -> Self {
        self.communities.insert(
            query.to_string(),
            communities.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    pub fn on_hot(mut self, community: &str, posts: Vec<EnrichedItem>) -> Self {
        self.hot.insert(community.to_string(), posts);
        self
    }

    pub fn on_topic(mut self, topic: &str, posts: Vec<EnrichedItem>) -> Self {
        self.by_topic.insert(topic.to_string(), posts);
        self
    }

    pub fn failing_community_search(mut self) -> Self {
        self.fail_community_search = true;
        self
    }

    pub fn topic_requests(&self) -> Vec<String> {
        self.topic_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PostSource for MockPostSource {
    async fn search_communities(&self, query: &str, limit: u32) -> Result<Vec<String>> {
        if self.fail_community_search {
            bail!("MockPostSource: community search failed for {query}");
        }
        let mut found = self.communities.get(query).cloned().unwrap_or_default();
        found.truncate(limit as usize);
        Ok(found)
    }

    async fn hot_posts(
        &self,
        communities: &[String],
        limit_per_community: u32,
    ) -> Result<Vec<EnrichedItem>> {
        Ok(communities
            .iter()
            .flat_map(|c| {
                self.hot
                    .get(c)
                    .cloned()
                    .unwrap_or_default()
                    .into_iter()
                    .take(limit_per_community as usize)
            })
            .collect())
    }

    async fn posts_for_topic(
        &self,
        topic: &str,
        _communities: &[String],
        limit: usize,
    ) -> Result<Vec<EnrichedItem>> {
        self.topic_requests.lock().unwrap().push(topic.to_string());
        let mut posts = self.by_topic.get(topic).cloned().unwrap_or_default();
        posts.truncate(limit);
        Ok(posts)
    }
}

// ---------------------------------------------------------------------------
// Record builders
// ---------------------------------------------------------------------------

pub fn video_record(id: &str, title: &str, channel_id: &str) -> VideoRecord {
    VideoRecord {
        id: id.to_string(),
        title: title.to_string(),
        url: format!("https://www.youtube.com/watch?v={id}"),
        metrics: BTreeMap::from([("views".to_string(), 1_000), ("likes".to_string(), 50)]),
        published_at: "2024-04-20T12:00:00Z".to_string(),
        channel_id: channel_id.to_string(),
        channel_title: format!("{channel_id} title"),
    }
}

pub fn comment(id: &str, text: &str, score: i64) -> RawComment {
    RawComment {
        id: id.to_string(),
        author: format!("author-{id}"),
        text: text.to_string(),
        published_at: "2024-04-21T08:00:00Z".to_string(),
        score,
    }
}

pub fn thread(id: &str, text: &str, score: i64, reply_count: u64) -> ThreadRecord {
    ThreadRecord {
        id: id.to_string(),
        comment: comment(id, text, score),
        reply_count,
    }
}

/// A forum post with a body and no comments.
pub fn forum_post(id: &str, title: &str, body: &str) -> EnrichedItem {
    EnrichedItem {
        id: id.to_string(),
        title: title.to_string(),
        url: format!("https://www.reddit.com/comments/{id}"),
        metrics: BTreeMap::from([("score".to_string(), 10), ("comments_count".to_string(), 0)]),
        published_at: "2024-04-22T09:30:00Z".to_string(),
        author: AuthorInfo::unknown(format!("user-{id}")),
        body: Body::from_text(body),
        comments: Vec::new(),
    }
}
