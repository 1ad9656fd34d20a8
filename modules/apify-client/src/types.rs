use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Apify wraps single-object responses in `{ "data": ... }`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartUrl {
    pub url: String,
}

/// Input for the trudax/reddit-scraper actor.
///
/// The actor runs either over `start_urls` (subreddit listings) or over
/// `searches` (site-wide keyword search), never both.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RedditScraperInput {
    #[serde(rename = "startUrls", skip_serializing_if = "Vec::is_empty")]
    pub start_urls: Vec<StartUrl>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub searches: Vec<String>,
    #[serde(rename = "searchPosts")]
    pub search_posts: bool,
    #[serde(rename = "searchCommunities")]
    pub search_communities: bool,
    #[serde(rename = "searchComments")]
    pub search_comments: bool,
    #[serde(rename = "skipComments")]
    pub skip_comments: bool,
    /// "hot", "new", "top", "relevance".
    pub sort: String,
    /// "hour", "day", "week", "month", "year", "all".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(rename = "maxItems")]
    pub max_items: u32,
    #[serde(rename = "maxPostCount")]
    pub max_post_count: u32,
    #[serde(rename = "maxComments")]
    pub max_comments: u32,
    #[serde(rename = "maxCommunitiesCount")]
    pub max_communities_count: u32,
}

/// One row of the reddit scraper dataset. Posts, comments and communities
/// share the schema and are told apart by `data_type`.
#[derive(Debug, Clone, Deserialize)]
pub struct RedditItem {
    pub id: Option<String>,
    #[serde(rename = "parsedId")]
    pub parsed_id: Option<String>,
    pub url: Option<String>,
    pub username: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    #[serde(rename = "communityName")]
    pub community_name: Option<String>,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    #[serde(rename = "upVotes")]
    pub up_votes: Option<i64>,
    #[serde(rename = "numberOfComments")]
    pub number_of_comments: Option<i64>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
    /// Post id for comments.
    #[serde(rename = "postId")]
    pub post_id: Option<String>,
    /// Post id (top-level comment) or comment id (reply).
    #[serde(rename = "parentId")]
    pub parent_id: Option<String>,
    /// "community", "post" or "comment".
    #[serde(rename = "dataType")]
    pub data_type: Option<String>,
}

impl RedditItem {
    pub fn is(&self, data_type: &str) -> bool {
        self.data_type.as_deref() == Some(data_type)
    }
}

/// Apify actor run metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct RunData {
    pub id: String,
    pub status: String,
    #[serde(rename = "defaultDatasetId")]
    pub default_dataset_id: String,
    #[serde(rename = "startedAt")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(rename = "finishedAt")]
    pub finished_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scraper_input_omits_unused_modes() {
        let input = RedditScraperInput {
            searches: vec!["budget".to_string()],
            search_communities: true,
            sort: "relevance".to_string(),
            max_items: 10,
            ..Default::default()
        };
        let json = serde_json::to_value(&input).unwrap();
        assert!(json.get("startUrls").is_none());
        assert!(json.get("time").is_none());
        assert_eq!(json["searches"][0], "budget");
        assert_eq!(json["searchCommunities"], true);
    }

    #[test]
    fn dataset_rows_deserialize_with_missing_fields() {
        let json = r#"[
            {"id": "t3_abc", "dataType": "post", "title": "Hello", "upVotes": 41},
            {"id": "t1_xyz", "dataType": "comment", "parentId": "t3_abc", "body": "hi"}
        ]"#;
        let rows: Vec<RedditItem> = serde_json::from_str(json).unwrap();
        assert!(rows[0].is("post"));
        assert_eq!(rows[0].up_votes, Some(41));
        assert!(rows[1].is("comment"));
        assert_eq!(rows[1].parent_id.as_deref(), Some("t3_abc"));
    }
}
