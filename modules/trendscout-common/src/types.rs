use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// --- Content body ---

/// Primary textual payload of an item (transcript or post text).
///
/// Serialized as the text itself, or `null` when unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Body {
    Available(String),
    Unavailable,
}

impl Body {
    /// Wrap resolved text, treating blank text as unavailable.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.trim().is_empty() {
            Body::Unavailable
        } else {
            Body::Available(text)
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Body::Available(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Available(text) => Some(text),
            Body::Unavailable => None,
        }
    }
}

// --- Author ---

/// Channel or account metadata for an item's author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorInfo {
    pub name: String,
    pub creation_date: String,
    pub followers: i64,
}

impl AuthorInfo {
    /// Fallback when the author lookup yields nothing or fails.
    pub fn unknown(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            creation_date: "Unknown".to_string(),
            followers: 0,
        }
    }
}

// --- Comments ---

/// A reply under a top-level comment. Replies do not nest further.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub author: String,
    pub text: String,
    pub published_at: String,
    pub score: i64,
}

/// A top-level comment with its flat list of replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentNode {
    pub author: String,
    pub text: String,
    pub published_at: String,
    pub score: i64,
    #[serde(default)]
    pub replies: Vec<Reply>,
}

/// Number of whitespace-separated words in a comment body.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

// --- Items ---

/// A fully enriched video or post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedItem {
    pub id: String,
    pub title: String,
    pub url: String,
    /// Engagement counters ("views", "likes", "score", "comments_count", ...).
    pub metrics: BTreeMap<String, i64>,
    pub published_at: String,
    pub author: AuthorInfo,
    pub body: Body,
    #[serde(default)]
    pub comments: Vec<CommentNode>,
}

// --- Report ---

/// One correlated topic with the items gathered for it from each platform.
/// Source A is the discussion forum, source B the video platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicReport {
    pub topic: String,
    #[serde(default)]
    pub items_from_source_a: Vec<EnrichedItem>,
    #[serde(default)]
    pub items_from_source_b: Vec<EnrichedItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_serializes_as_text_or_null() {
        assert_eq!(serde_json::to_string(&Body::Available("hi".into())).unwrap(), r#""hi""#);
        assert_eq!(serde_json::to_string(&Body::Unavailable).unwrap(), "null");
        assert_eq!(serde_json::from_str::<Body>("null").unwrap(), Body::Unavailable);
        assert_eq!(
            serde_json::from_str::<Body>(r#""words""#).unwrap(),
            Body::Available("words".into())
        );
    }

    #[test]
    fn blank_text_is_unavailable() {
        assert_eq!(Body::from_text("   \n"), Body::Unavailable);
        assert!(Body::from_text("content").is_available());
    }

    #[test]
    fn unknown_author_uses_fallback_values() {
        let author = AuthorInfo::unknown("chan");
        assert_eq!(author.creation_date, "Unknown");
        assert_eq!(author.followers, 0);
    }

    #[test]
    fn word_count_splits_on_any_whitespace() {
        assert_eq!(word_count("one  two\tthree\nfour"), 4);
        assert_eq!(word_count(""), 0);
    }
}
