//! One trend discovery run across both platforms.
//!
//! Gathers forum posts and enriched videos for the input topics, extracts
//! topic words on each side, and reports the topics both sides share. When
//! nothing is shared, each side's strongest topics are reported on their own.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use clap::ValueEnum;
use tracing::{info, warn};

use trendscout_common::types::{EnrichedItem, TopicReport};

use crate::pipeline::traits::PostSource;
use crate::pipeline::EnrichmentPipeline;
use crate::topics::{intersect, TopicExtractor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TimeWindow {
    LastMonth,
    LastThreeMonths,
    LastSixMonths,
    LastYear,
}

impl TimeWindow {
    pub fn days(self) -> i64 {
        match self {
            TimeWindow::LastMonth => 30,
            TimeWindow::LastThreeMonths => 90,
            TimeWindow::LastSixMonths => 180,
            TimeWindow::LastYear => 365,
        }
    }

    /// RFC 3339 lower bound, e.g. "2024-04-01T12:00:00Z".
    pub fn published_after(self, now: DateTime<Utc>) -> String {
        (now - Duration::days(self.days())).to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

#[derive(Debug, Clone)]
pub struct RunLimits {
    /// Communities looked up per input topic.
    pub communities_per_topic: u32,
    pub hot_posts_per_community: u32,
    pub forum_topics: usize,
    pub video_search_results: u32,
    pub videos_per_topic: usize,
    pub video_topics: usize,
    pub posts_per_topic: usize,
    /// Topics per side reported when the sides share none.
    pub fallback_topics: usize,
}

impl Default for RunLimits {
    fn default() -> Self {
        Self {
            communities_per_topic: 10,
            hot_posts_per_community: 15,
            forum_topics: 15,
            video_search_results: 10,
            videos_per_topic: 5,
            video_topics: 10,
            posts_per_topic: 15,
            fallback_topics: 5,
        }
    }
}

pub struct TrendRun {
    posts: Arc<dyn PostSource>,
    pipeline: Arc<EnrichmentPipeline>,
    topics: TopicExtractor,
    limits: RunLimits,
}

impl TrendRun {
    pub fn new(posts: Arc<dyn PostSource>, pipeline: Arc<EnrichmentPipeline>) -> Self {
        Self {
            posts,
            pipeline,
            topics: TopicExtractor::english(),
            limits: RunLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: RunLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_extractor(mut self, topics: TopicExtractor) -> Self {
        self.topics = topics;
        self
    }

    pub async fn run(
        &self,
        input_topics: &[String],
        window: TimeWindow,
        now: DateTime<Utc>,
    ) -> Vec<TopicReport> {
        let published_after = window.published_after(now);
        info!(topics = ?input_topics, ?window, published_after = published_after.as_str(), "Starting trend run");

        let communities = self.communities(input_topics).await;
        let hot = match self
            .posts
            .hot_posts(&communities, self.limits.hot_posts_per_community)
            .await
        {
            Ok(posts) => posts,
            Err(e) => {
                warn!(error = %e, "Hot posts unavailable");
                Vec::new()
            }
        };
        let forum_topics = self.topics.extract(&forum_texts(&hot), self.limits.forum_topics);
        info!(posts = hot.len(), topics = ?forum_topics, "Forum topics extracted");

        let mut seed_videos = Vec::new();
        for topic in input_topics {
            seed_videos.extend(self.videos_for(topic, &published_after).await);
        }
        let titles: Vec<&str> = seed_videos.iter().map(|v| v.title.as_str()).collect();
        let video_topics = self.topics.extract(&titles, self.limits.video_topics);
        info!(videos = seed_videos.len(), topics = ?video_topics, "Video topics extracted");

        let common = intersect(&forum_topics, &video_topics);
        let mut reports = Vec::new();

        if !common.is_empty() {
            info!(common = ?common, "Common topics found");
            for topic in &common {
                reports.push(TopicReport {
                    topic: topic.clone(),
                    items_from_source_a: self.posts_for(topic, &communities).await,
                    items_from_source_b: self.videos_for(topic, &published_after).await,
                });
            }
        } else {
            info!("No common topics, reporting each platform separately");
            for topic in forum_topics.iter().take(self.limits.fallback_topics) {
                reports.push(TopicReport {
                    topic: topic.clone(),
                    items_from_source_a: self.posts_for(topic, &communities).await,
                    items_from_source_b: Vec::new(),
                });
            }
            for topic in video_topics.iter().take(self.limits.fallback_topics) {
                reports.push(TopicReport {
                    topic: topic.clone(),
                    items_from_source_a: Vec::new(),
                    items_from_source_b: self.videos_for(topic, &published_after).await,
                });
            }
        }

        info!(reports = reports.len(), "Trend run complete");
        reports
    }

    /// Union of communities across input topics, first-seen order.
    async fn communities(&self, input_topics: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut communities = Vec::new();
        for topic in input_topics {
            match self
                .posts
                .search_communities(topic, self.limits.communities_per_topic)
                .await
            {
                Ok(found) => communities.extend(found.into_iter().filter(|c| seen.insert(c.clone()))),
                Err(e) => warn!(topic = topic.as_str(), error = %e, "Community search failed"),
            }
        }
        info!(communities = communities.len(), "Communities collected");
        communities
    }

    async fn posts_for(&self, topic: &str, communities: &[String]) -> Vec<EnrichedItem> {
        match self
            .posts
            .posts_for_topic(topic, communities, self.limits.posts_per_topic)
            .await
        {
            Ok(posts) => posts,
            Err(e) => {
                warn!(topic, error = %e, "Forum posts unavailable for topic");
                Vec::new()
            }
        }
    }

    async fn videos_for(&self, topic: &str, published_after: &str) -> Vec<EnrichedItem> {
        self.pipeline
            .enrich(
                topic,
                self.limits.video_search_results,
                self.limits.videos_per_topic,
                Some(published_after),
            )
            .await
    }
}

fn forum_texts(posts: &[EnrichedItem]) -> Vec<String> {
    posts
        .iter()
        .map(|p| match p.body.as_text() {
            Some(body) => format!("{} {}", p.title, body),
            None => p.title.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn windows_subtract_whole_days_in_utc() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(TimeWindow::LastMonth.published_after(now), "2024-04-01T12:00:00Z");
        assert_eq!(TimeWindow::LastThreeMonths.published_after(now), "2024-02-01T12:00:00Z");
        assert_eq!(TimeWindow::LastYear.published_after(now), "2023-05-02T12:00:00Z");
    }

    #[test]
    fn window_parses_from_cli_value() {
        assert_eq!(
            TimeWindow::from_str("last-six-months", false).unwrap(),
            TimeWindow::LastSixMonths
        );
    }
}
