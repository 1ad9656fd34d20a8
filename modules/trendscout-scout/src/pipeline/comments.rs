use std::collections::HashSet;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use trendscout_common::types::{word_count, CommentNode, Reply};

use super::traits::{RawComment, ThreadRecord, VideoPlatform};
use crate::scheduling::{CredentialSelector, Operation};

/// Comments shorter than this many words are dropped.
pub const MIN_COMMENT_WORDS: usize = 6;

/// Raw threads gathered per requested top-level comment, before filtering.
const OVERFETCH_FACTOR: usize = 2;

#[derive(Debug, Clone)]
pub struct CommentConfig {
    /// Items requested per listing page (provider maximum is 100).
    pub page_size: u32,
    /// Replies kept per thread.
    pub max_replies: usize,
    /// Concurrent reply fetches.
    pub workers: usize,
    pub min_words: usize,
}

impl Default for CommentConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            max_replies: 100,
            workers: 3,
            min_words: MIN_COMMENT_WORDS,
        }
    }
}

/// Fetches, filters and ranks an item's comment threads.
pub struct CommentTreeFetcher {
    platform: Arc<dyn VideoPlatform>,
    selector: Arc<CredentialSelector>,
    config: CommentConfig,
}

impl CommentTreeFetcher {
    pub fn new(
        platform: Arc<dyn VideoPlatform>,
        selector: Arc<CredentialSelector>,
        config: CommentConfig,
    ) -> Self {
        Self {
            platform,
            selector,
            config,
        }
    }

    /// Top `max_top_level` comments by score, each with its replies.
    ///
    /// Never fails: a page that cannot be fetched ends pagination and the
    /// threads gathered so far are used.
    pub async fn fetch(&self, item_id: &str, max_top_level: usize) -> Vec<CommentNode> {
        if max_top_level == 0 {
            return Vec::new();
        }

        let threads = self
            .gather_threads(item_id, max_top_level.saturating_mul(OVERFETCH_FACTOR))
            .await;
        let gathered = threads.len();
        let selected = select_top_level(threads, max_top_level, self.config.min_words);

        // Ranked position travels with each thread so completion order does not
        // leak into the result.
        let mut nodes: Vec<(usize, CommentNode)> =
            stream::iter(selected.into_iter().enumerate().map(|(rank, thread)| async move {
                (rank, self.build_node(thread).await)
            }))
            .buffer_unordered(self.config.workers.max(1))
            .collect()
            .await;
        nodes.sort_by_key(|(rank, _)| *rank);

        debug!(item_id, gathered, kept = nodes.len(), "Comment tree fetched");
        nodes.into_iter().map(|(_, node)| node).collect()
    }

    async fn gather_threads(&self, item_id: &str, wanted: usize) -> Vec<ThreadRecord> {
        let mut seen = HashSet::new();
        let mut threads = Vec::new();
        let mut page_token: Option<String> = None;

        while threads.len() < wanted {
            let credential = match self.selector.acquire(Operation::CommentThreads) {
                Ok(c) => c,
                Err(e) => {
                    warn!(item_id, error = %e, "Stopping comment pagination");
                    break;
                }
            };

            let page = match self
                .platform
                .comment_threads(&credential.key, item_id, page_token.as_deref(), self.config.page_size)
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    warn!(item_id, error = %e, "Comment page failed");
                    break;
                }
            };

            for thread in page.items {
                if seen.insert(thread.id.clone()) {
                    threads.push(thread);
                }
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        threads
    }

    async fn build_node(&self, thread: ThreadRecord) -> CommentNode {
        let replies = if thread.reply_count == 0 {
            Vec::new()
        } else {
            self.fetch_replies(&thread.id)
                .await
                .into_iter()
                .map(into_reply)
                .collect()
        };

        let comment = thread.comment;
        CommentNode {
            author: comment.author,
            text: comment.text,
            published_at: comment.published_at,
            score: comment.score,
            replies,
        }
    }

    /// Replies in provider order, deduplicated, at most `max_replies`.
    async fn fetch_replies(&self, parent_id: &str) -> Vec<RawComment> {
        let mut seen = HashSet::new();
        let mut replies = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let credential = match self.selector.acquire(Operation::Comments) {
                Ok(c) => c,
                Err(e) => {
                    warn!(parent_id, error = %e, "Stopping reply pagination");
                    break;
                }
            };

            let page = match self
                .platform
                .replies(&credential.key, parent_id, page_token.as_deref(), self.config.page_size)
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    warn!(parent_id, error = %e, "Reply page failed");
                    break;
                }
            };

            for reply in page.items {
                if seen.insert(reply.id.clone()) {
                    replies.push(reply);
                }
            }

            if replies.len() >= self.config.max_replies {
                break;
            }
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        replies.truncate(self.config.max_replies);
        replies
    }
}

/// Drop short comments, rank by score (stable), keep the first `max`.
pub fn select_top_level(
    threads: Vec<ThreadRecord>,
    max: usize,
    min_words: usize,
) -> Vec<ThreadRecord> {
    let mut kept: Vec<ThreadRecord> = threads
        .into_iter()
        .filter(|t| word_count(&t.comment.text) >= min_words)
        .collect();
    kept.sort_by(|a, b| b.comment.score.cmp(&a.comment.score));
    kept.truncate(max);
    kept
}

fn into_reply(comment: RawComment) -> Reply {
    Reply {
        author: comment.author,
        text: comment.text,
        published_at: comment.published_at,
        score: comment.score,
    }
}
