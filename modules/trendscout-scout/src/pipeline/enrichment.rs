use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use thiserror::Error;
use tracing::{debug, info, warn};

use trendscout_common::types::{AuthorInfo, Body, EnrichedItem};

use super::comments::{CommentConfig, CommentTreeFetcher};
use super::stats::EnrichStats;
use super::traits::{BodyResolver, SearchRequest, VideoPlatform, VideoRecord};
use crate::scheduling::{CredentialSelector, Operation, QuotaExhausted};

/// Provider ordering for the seeding search.
const SEARCH_ORDER: &str = "viewCount";

#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    /// Candidates enriched concurrently.
    pub workers: usize,
    /// Top-level comments kept per item.
    pub max_comments: usize,
    pub comments: CommentConfig,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            workers: 3,
            max_comments: 15,
            comments: CommentConfig::default(),
        }
    }
}

impl EnrichmentConfig {
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers,
            comments: CommentConfig {
                workers,
                ..CommentConfig::default()
            },
            ..Self::default()
        }
    }
}

/// Why a candidate produced no item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No body; no quota was spent on the candidate.
    BodyUnavailable,
    /// The item lookup returned nothing.
    NotFound,
    QuotaExhausted,
    LookupFailed(String),
    /// The success target was met before the candidate started.
    Cancelled,
}

#[derive(Debug)]
pub enum CandidateOutcome {
    Enriched(EnrichedItem),
    Skipped(SkipReason),
}

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error(transparent)]
    QuotaExhausted(#[from] QuotaExhausted),

    #[error(transparent)]
    Lookup(#[from] anyhow::Error),
}

/// Search → body check → item lookup → author lookup → comment tree.
pub struct EnrichmentPipeline {
    platform: Arc<dyn VideoPlatform>,
    bodies: Arc<dyn BodyResolver>,
    selector: Arc<CredentialSelector>,
    comments: CommentTreeFetcher,
    config: EnrichmentConfig,
}

impl EnrichmentPipeline {
    pub fn new(
        platform: Arc<dyn VideoPlatform>,
        bodies: Arc<dyn BodyResolver>,
        selector: Arc<CredentialSelector>,
        config: EnrichmentConfig,
    ) -> Self {
        let comments =
            CommentTreeFetcher::new(platform.clone(), selector.clone(), config.comments.clone());
        Self {
            platform,
            bodies,
            selector,
            comments,
            config,
        }
    }

    pub fn selector(&self) -> &Arc<CredentialSelector> {
        &self.selector
    }

    /// Up to `success_target` fully enriched items for `query`.
    ///
    /// Never fails: a failed search yields an empty result, failed candidates
    /// are skipped. Which items are returned under early stop depends on
    /// completion order.
    pub async fn enrich(
        &self,
        query: &str,
        search_result_limit: u32,
        success_target: usize,
        published_after: Option<&str>,
    ) -> Vec<EnrichedItem> {
        if success_target == 0 {
            return Vec::new();
        }

        let request = SearchRequest {
            query: query.to_string(),
            max_results: search_result_limit,
            order: SEARCH_ORDER.to_string(),
            published_after: published_after.map(String::from),
        };
        let candidates = match self.search(&request).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(query, error = %e, "Search failed, returning no videos");
                return Vec::new();
            }
        };
        info!(query, candidates = candidates.len(), success_target, "Enriching candidates");

        let stop = AtomicBool::new(false);
        let mut stats = EnrichStats {
            candidates: candidates.len() as u32,
            ..EnrichStats::default()
        };
        let mut items = Vec::with_capacity(success_target);

        let mut outcomes = stream::iter(
            candidates
                .iter()
                .map(|id| self.enrich_candidate(id, &stop)),
        )
        .buffer_unordered(self.config.workers.max(1));

        // Keep draining after the target is met: queued candidates see the
        // stop flag and return at once, in-flight ones finish and are dropped.
        while let Some(outcome) = outcomes.next().await {
            match outcome {
                CandidateOutcome::Enriched(item) if items.len() < success_target => {
                    stats.enriched += 1;
                    items.push(item);
                    if items.len() == success_target {
                        stop.store(true, Ordering::SeqCst);
                        info!(query, success_target, "Success target reached");
                    }
                }
                CandidateOutcome::Enriched(item) => {
                    debug!(query, video_id = item.id.as_str(), "Discarding result over target");
                    stats.discarded_over_target += 1;
                }
                CandidateOutcome::Skipped(reason) => stats.record_skip(&reason),
            }
        }

        info!(query, "{stats}");
        items
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<String>, EnrichError> {
        let credential = self.selector.acquire(Operation::Search)?;
        Ok(self.platform.search(&credential.key, request).await?)
    }

    async fn enrich_candidate(&self, video_id: &str, stop: &AtomicBool) -> CandidateOutcome {
        if stop.load(Ordering::SeqCst) {
            return CandidateOutcome::Skipped(SkipReason::Cancelled);
        }

        // Unmetered. Nothing below runs, and nothing is charged, without a body.
        let body = self.bodies.resolve(video_id).await;
        if !body.is_available() {
            info!(video_id, "Skipping video: no transcript available");
            return CandidateOutcome::Skipped(SkipReason::BodyUnavailable);
        }

        if stop.load(Ordering::SeqCst) {
            return CandidateOutcome::Skipped(SkipReason::Cancelled);
        }

        match self.enrich_with_body(video_id, body).await {
            Ok(Some(item)) => CandidateOutcome::Enriched(item),
            Ok(None) => {
                info!(video_id, "Skipping video: not found");
                CandidateOutcome::Skipped(SkipReason::NotFound)
            }
            Err(EnrichError::QuotaExhausted(e)) => {
                warn!(video_id, error = %e, "Skipping video: quota exhausted");
                CandidateOutcome::Skipped(SkipReason::QuotaExhausted)
            }
            Err(EnrichError::Lookup(e)) => {
                warn!(video_id, error = %e, "Skipping video: lookup failed");
                CandidateOutcome::Skipped(SkipReason::LookupFailed(e.to_string()))
            }
        }
    }

    async fn enrich_with_body(
        &self,
        video_id: &str,
        body: Body,
    ) -> Result<Option<EnrichedItem>, EnrichError> {
        let credential = self.selector.acquire(Operation::Videos)?;
        let Some(video) = self.platform.video(&credential.key, video_id).await? else {
            return Ok(None);
        };

        let author = self.author_info(&video).await;
        let comments = self.comments.fetch(video_id, self.config.max_comments).await;

        Ok(Some(EnrichedItem {
            id: video.id,
            title: video.title,
            url: video.url,
            metrics: video.metrics,
            published_at: video.published_at,
            author,
            body,
            comments,
        }))
    }

    /// Channel metadata, or the "Unknown" fallback on any failure.
    async fn author_info(&self, video: &VideoRecord) -> AuthorInfo {
        let fallback = || AuthorInfo::unknown(video.channel_title.clone());

        let credential = match self.selector.acquire(Operation::Channels) {
            Ok(c) => c,
            Err(e) => {
                warn!(channel_id = video.channel_id.as_str(), error = %e, "Channel lookup skipped");
                return fallback();
            }
        };

        match self.platform.channel(&credential.key, &video.channel_id).await {
            Ok(Some(channel)) => AuthorInfo {
                name: video.channel_title.clone(),
                creation_date: channel.creation_date,
                followers: channel.followers,
            },
            Ok(None) => fallback(),
            Err(e) => {
                warn!(channel_id = video.channel_id.as_str(), error = %e, "Channel lookup failed");
                fallback()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::traits::ChannelRecord;
    use crate::scheduling::CredentialId;
    use crate::testing::{test_selector, video_record, MockBodies, MockPlatform};

    fn pipeline(
        platform: MockPlatform,
        bodies: MockBodies,
        keys: usize,
        quota: u64,
    ) -> (EnrichmentPipeline, Arc<MockPlatform>) {
        let platform = Arc::new(platform);
        let pipeline = EnrichmentPipeline::new(
            platform.clone(),
            Arc::new(bodies),
            test_selector(keys, quota),
            EnrichmentConfig::default(),
        );
        (pipeline, platform)
    }

    #[tokio::test]
    async fn zero_target_makes_no_calls() {
        let (pipeline, platform) = pipeline(
            MockPlatform::new().on_search("q", &["a"]),
            MockBodies::new().with_body("a", "text"),
            1,
            10_000,
        );
        assert!(pipeline.enrich("q", 10, 0, None).await.is_empty());
        assert!(platform.calls().is_empty());
    }

    #[tokio::test]
    async fn search_is_charged_at_search_rate() {
        let (pipeline, platform) = pipeline(
            MockPlatform::new().on_search("q", &[]),
            MockBodies::new(),
            1,
            10_000,
        );
        assert!(pipeline.enrich("q", 10, 5, Some("2024-01-01T00:00:00Z")).await.is_empty());
        assert_eq!(platform.count(Operation::Search), 1);
        assert_eq!(pipeline.selector().ledger().usage(CredentialId(0)), Some(100));
    }

    #[tokio::test]
    async fn search_request_carries_limit_order_and_window() {
        let (pipeline, platform) = pipeline(
            MockPlatform::new().on_search("q", &[]),
            MockBodies::new(),
            1,
            10_000,
        );
        pipeline.enrich("q", 7, 5, Some("2024-01-01T00:00:00Z")).await;

        let request = platform.last_search().unwrap();
        assert_eq!(request.max_results, 7);
        assert_eq!(request.order, "viewCount");
        assert_eq!(request.published_after.as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[tokio::test]
    async fn author_info_comes_from_channel_lookup() {
        let platform = MockPlatform::new()
            .on_search("q", &["a"])
            .on_video(video_record("a", "Title", "chan-a"))
            .on_channel(
                "chan-a",
                ChannelRecord {
                    creation_date: "2015-01-01T00:00:00Z".to_string(),
                    followers: 42,
                },
            );
        let (pipeline, platform) = pipeline(platform, MockBodies::new().with_body("a", "text"), 1, 10_000);

        let items = pipeline.enrich("q", 10, 1, None).await;
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0].author,
            AuthorInfo {
                name: "chan-a title".to_string(),
                creation_date: "2015-01-01T00:00:00Z".to_string(),
                followers: 42,
            }
        );
        assert_eq!(platform.count(Operation::Channels), 1);
    }

    #[tokio::test]
    async fn author_lookup_falls_back_on_failure() {
        let platform = MockPlatform::new()
            .on_search("q", &["a"])
            .on_video(video_record("a", "Title", "chan-a"))
            .failing(Operation::Channels, "chan-a");
        let (pipeline, _) = pipeline(platform, MockBodies::new().with_body("a", "text"), 1, 10_000);

        let items = pipeline.enrich("q", 10, 1, None).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].author.creation_date, "Unknown");
        assert_eq!(items[0].author.followers, 0);
    }

    #[tokio::test]
    async fn missing_video_is_skipped() {
        let platform = MockPlatform::new()
            .on_search("q", &["gone", "b"])
            .on_video(video_record("b", "Title", "chan-b"));
        let bodies = MockBodies::new().with_body("gone", "text").with_body("b", "text");
        let (pipeline, _) = pipeline(platform, bodies, 1, 10_000);

        let items = pipeline.enrich("q", 10, 5, None).await;
        assert_eq!(items.iter().map(|i| i.id.as_str()).collect::<Vec<_>>(), vec!["b"]);
    }
}
