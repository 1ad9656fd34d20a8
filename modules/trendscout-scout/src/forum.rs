// Forum platform (source A): subreddit discovery, hot posts, topic search.
// Wraps ApifyClient and turns dataset rows into enriched posts.

use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::Result;
use apify_client::{ApifyClient, RedditItem};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use trendscout_common::types::{AuthorInfo, Body, CommentNode, EnrichedItem, Reply};

use crate::pipeline::traits::PostSource;

const UNKNOWN_AUTHOR: &str = "Unknown";

#[derive(Debug, Clone)]
pub struct ForumLimits {
    pub comments_per_post: usize,
    pub replies_per_comment: usize,
    /// Subreddits scraped concurrently for hot listings.
    pub concurrency: usize,
    /// Reddit search time filter for topic searches.
    pub topic_time: String,
}

impl Default for ForumLimits {
    fn default() -> Self {
        Self {
            comments_per_post: 10,
            replies_per_comment: 5,
            concurrency: 3,
            topic_time: "month".to_string(),
        }
    }
}

pub struct RedditSource {
    client: ApifyClient,
    limits: ForumLimits,
}

impl RedditSource {
    pub fn new(client: ApifyClient) -> Self {
        Self::with_limits(client, ForumLimits::default())
    }

    pub fn with_limits(client: ApifyClient, limits: ForumLimits) -> Self {
        Self { client, limits }
    }
}

#[async_trait]
impl PostSource for RedditSource {
    async fn search_communities(&self, query: &str, limit: u32) -> Result<Vec<String>> {
        let rows = self.client.search_reddit_communities(query, limit).await?;
        let names = community_names(&rows);
        info!(query, found = names.len(), "reddit: communities found");
        Ok(names)
    }

    async fn hot_posts(
        &self,
        communities: &[String],
        limit_per_community: u32,
    ) -> Result<Vec<EnrichedItem>> {
        let max_comments = self.limits.comments_per_post as u32;
        let fetched: Vec<_> = stream::iter(communities.to_vec().into_iter().map(|community| async move {
            let rows = self
                .client
                .scrape_subreddit_hot(&community, limit_per_community, max_comments)
                .await;
            (community, rows)
        }))
        .buffered(self.limits.concurrency.max(1))
        .collect()
        .await;

        let mut seen_urls = HashSet::new();
        let mut posts = Vec::new();
        for (community, rows) in fetched {
            match rows {
                Ok(rows) => {
                    let assembled = assemble_posts(rows, &self.limits);
                    posts.extend(dedup_by_url(assembled, &mut seen_urls));
                }
                Err(e) => warn!(community = community.as_str(), error = %e, "Could not fetch hot posts"),
            }
        }

        info!(communities = communities.len(), posts = posts.len(), "reddit: hot posts fetched");
        Ok(posts)
    }

    async fn posts_for_topic(
        &self,
        topic: &str,
        communities: &[String],
        limit: usize,
    ) -> Result<Vec<EnrichedItem>> {
        let max_comments = self.limits.comments_per_post as u32;
        let mut seen_urls = HashSet::new();
        let mut posts = Vec::new();

        for community in communities {
            if posts.len() >= limit {
                break;
            }
            match self
                .client
                .search_subreddit(community, topic, limit as u32, &self.limits.topic_time, max_comments)
                .await
            {
                Ok(rows) => {
                    let assembled = assemble_posts(rows, &self.limits);
                    posts.extend(dedup_by_url(assembled, &mut seen_urls));
                }
                Err(e) => warn!(topic, community = community.as_str(), error = %e, "Topic search failed"),
            }
        }

        posts.truncate(limit);
        info!(topic, posts = posts.len(), "reddit: topic posts gathered");
        Ok(posts)
    }
}

/// Subreddit names from community rows, in result order, without duplicates.
pub fn community_names(rows: &[RedditItem]) -> Vec<String> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter(|r| r.is("community"))
        .filter_map(|r| {
            r.display_name
                .clone()
                .or_else(|| r.community_name.clone())
                .or_else(|| r.url.as_deref().and_then(subreddit_from_url))
        })
        .map(|name| name.trim_start_matches("r/").to_string())
        .filter(|name| !name.is_empty() && seen.insert(name.to_lowercase()))
        .collect()
}

/// Extract a subreddit name from a URL like "https://www.reddit.com/r/NAME/..."
fn subreddit_from_url(url: &str) -> Option<String> {
    let parts: Vec<&str> = url.split('/').collect();
    parts
        .iter()
        .position(|p| *p == "r")
        .and_then(|i| parts.get(i + 1))
        .filter(|name| !name.is_empty())
        .map(|name| name.to_string())
}

/// Turn post and comment rows into posts with ranked comment trees.
///
/// Posts without body text are dropped. Top-level comments are those whose
/// parent is the post, replies those whose parent is a top-level comment.
pub fn assemble_posts(rows: Vec<RedditItem>, limits: &ForumLimits) -> Vec<EnrichedItem> {
    let mut posts = Vec::new();
    let mut children: HashMap<String, Vec<RedditItem>> = HashMap::new();

    for row in rows {
        if row.is("post") {
            posts.push(row);
        } else if row.is("comment") {
            if let Some(parent) = row.parent_id.clone() {
                children.entry(parent).or_default().push(row);
            }
        }
    }

    posts
        .into_iter()
        .filter_map(|post| {
            let post_id = post.id.clone().unwrap_or_default();
            let body = Body::from_text(post.body.clone().unwrap_or_default());
            if !body.is_available() {
                info!(post_id = post_id.as_str(), "Skipping post: no selftext");
                return None;
            }

            let mut top_level = children.remove(&post_id).unwrap_or_default();
            sort_by_votes(&mut top_level);
            top_level.truncate(limits.comments_per_post);

            let comments = top_level
                .into_iter()
                .map(|comment| {
                    let comment_id = comment.id.clone().unwrap_or_default();
                    let mut replies = children.remove(&comment_id).unwrap_or_default();
                    sort_by_votes(&mut replies);
                    replies.truncate(limits.replies_per_comment);
                    CommentNode {
                        author: author_name(&comment),
                        text: comment.body.clone().unwrap_or_default(),
                        published_at: comment.created_at.clone().unwrap_or_default(),
                        score: comment.up_votes.unwrap_or(0),
                        replies: replies
                            .into_iter()
                            .map(|r| Reply {
                                author: author_name(&r),
                                text: r.body.unwrap_or_default(),
                                published_at: r.created_at.unwrap_or_default(),
                                score: r.up_votes.unwrap_or(0),
                            })
                            .collect(),
                    }
                })
                .collect();

            Some(EnrichedItem {
                id: post.parsed_id.clone().unwrap_or(post_id),
                title: post.title.clone().unwrap_or_default(),
                url: post.url.clone().unwrap_or_default(),
                metrics: BTreeMap::from([
                    ("score".to_string(), post.up_votes.unwrap_or(0)),
                    ("comments_count".to_string(), post.number_of_comments.unwrap_or(0)),
                ]),
                published_at: post.created_at.clone().unwrap_or_default(),
                author: AuthorInfo::unknown(author_name(&post)),
                body,
                comments,
            })
        })
        .collect()
}

/// Keep posts whose URL has not been seen yet.
pub fn dedup_by_url(posts: Vec<EnrichedItem>, seen: &mut HashSet<String>) -> Vec<EnrichedItem> {
    posts
        .into_iter()
        .filter(|p| seen.insert(p.url.clone()))
        .collect()
}

fn sort_by_votes(rows: &mut [RedditItem]) {
    rows.sort_by(|a, b| b.up_votes.unwrap_or(0).cmp(&a.up_votes.unwrap_or(0)));
}

fn author_name(row: &RedditItem) -> String {
    row.username
        .clone()
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(json: serde_json::Value) -> RedditItem {
        serde_json::from_value(json).unwrap()
    }

    fn post(id: &str, body: &str, url: &str) -> RedditItem {
        row(serde_json::json!({
            "id": id, "parsedId": id.trim_start_matches("t3_"), "dataType": "post",
            "title": format!("title {id}"), "body": body, "url": url,
            "username": "poster", "upVotes": 120, "numberOfComments": 4,
            "createdAt": "2024-04-22T09:30:00.000Z"
        }))
    }

    fn comment(id: &str, parent: &str, votes: i64) -> RedditItem {
        row(serde_json::json!({
            "id": id, "dataType": "comment", "parentId": parent,
            "body": format!("comment {id}"), "upVotes": votes
        }))
    }

    #[test]
    fn builds_two_level_trees_ranked_by_votes() {
        let rows = vec![
            post("t3_a", "some self text", "https://reddit.com/a"),
            comment("t1_1", "t3_a", 5),
            comment("t1_2", "t3_a", 50),
            comment("t1_3", "t1_2", 1),
            comment("t1_4", "t1_2", 9),
            comment("t1_5", "t1_4", 100), // third level, dropped
        ];

        let posts = assemble_posts(rows, &ForumLimits::default());
        assert_eq!(posts.len(), 1);
        let p = &posts[0];
        assert_eq!(p.id, "a");
        assert_eq!(p.metrics["score"], 120);
        assert_eq!(p.author.name, "poster");
        assert_eq!(p.comments.iter().map(|c| c.score).collect::<Vec<_>>(), vec![50, 5]);
        assert_eq!(p.comments[0].replies.iter().map(|r| r.score).collect::<Vec<_>>(), vec![9, 1]);
        assert_eq!(p.comments[0].author, "Unknown");
        assert!(p.comments[1].replies.is_empty());
    }

    #[test]
    fn posts_without_selftext_are_skipped() {
        let rows = vec![
            post("t3_a", "   ", "https://reddit.com/a"),
            post("t3_b", "real text", "https://reddit.com/b"),
        ];
        let posts = assemble_posts(rows, &ForumLimits::default());
        assert_eq!(posts.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn comment_and_reply_limits_apply() {
        let mut rows = vec![post("t3_a", "text", "https://reddit.com/a")];
        for i in 0..12 {
            rows.push(comment(&format!("t1_c{i}"), "t3_a", i));
        }
        for i in 0..7 {
            rows.push(comment(&format!("t1_r{i}"), "t1_c11", i));
        }

        let posts = assemble_posts(rows, &ForumLimits::default());
        assert_eq!(posts[0].comments.len(), 10);
        assert_eq!(posts[0].comments[0].score, 11);
        assert_eq!(posts[0].comments[0].replies.len(), 5);
    }

    #[test]
    fn duplicate_urls_are_dropped_across_batches() {
        let mut seen = HashSet::new();
        let first = assemble_posts(
            vec![post("t3_a", "text", "https://reddit.com/a")],
            &ForumLimits::default(),
        );
        let second = assemble_posts(
            vec![
                post("t3_a", "text", "https://reddit.com/a"),
                post("t3_b", "text", "https://reddit.com/b"),
            ],
            &ForumLimits::default(),
        );
        assert_eq!(dedup_by_url(first, &mut seen).len(), 1);
        let kept = dedup_by_url(second, &mut seen);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "b");
    }

    #[test]
    fn community_names_come_from_any_available_field() {
        let rows = vec![
            row(serde_json::json!({"dataType": "community", "displayName": "IndiaSpeaks"})),
            row(serde_json::json!({"dataType": "community", "communityName": "r/india"})),
            row(serde_json::json!({"dataType": "community", "url": "https://www.reddit.com/r/politics/"})),
            row(serde_json::json!({"dataType": "community", "displayName": "india"})),
            row(serde_json::json!({"dataType": "post", "communityName": "r/ignored"})),
        ];
        assert_eq!(community_names(&rows), vec!["IndiaSpeaks", "india", "politics"]);
    }
}
