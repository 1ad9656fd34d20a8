pub mod error;
pub mod types;

pub use error::{ApifyError, Result};
pub use types::{RedditItem, RedditScraperInput, RunData, StartUrl};

use serde::de::DeserializeOwned;
use url::Url;
use types::ApiResponse;

const BASE_URL: &str = "https://api.apify.com/v2";

/// Actor path for trudax/reddit-scraper.
const REDDIT_SCRAPER: &str = "trudax~reddit-scraper";

/// Client for the Apify actor API, scoped to one account token.
pub struct ApifyClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl ApifyClient {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Point the client at a different API root.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Send an authorized request and decode the JSON body, mapping non-2xx
    /// statuses to `ApifyError::Api`.
    async fn send_json<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let resp = request.bearer_auth(&self.token).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ApifyError::Api {
                status: status.as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }
        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Start an actor run and return its metadata without waiting.
    pub async fn start_run<I: serde::Serialize>(&self, actor: &str, input: &I) -> Result<RunData> {
        let url = format!("{}/acts/{actor}/runs", self.base_url);
        let started: ApiResponse<RunData> =
            self.send_json(self.client.post(&url).json(input)).await?;
        Ok(started.data)
    }

    /// Long-poll a run (60s per request) until it reaches a terminal status.
    pub async fn wait_for_run(&self, run_id: &str) -> Result<RunData> {
        let url = format!("{}/actor-runs/{run_id}", self.base_url);
        loop {
            let polled: ApiResponse<RunData> = self
                .send_json(self.client.get(&url).query(&[("waitForFinish", "60")]))
                .await?;
            let run = polled.data;
            match run.status.as_str() {
                "SUCCEEDED" => return Ok(run),
                "FAILED" | "ABORTED" | "TIMED-OUT" => return Err(ApifyError::RunFailed(run.status)),
                other => tracing::debug!(run_id, status = other, "Run still in progress"),
            }
        }
    }

    /// All rows of a dataset, as JSON.
    pub async fn get_dataset_items<T: DeserializeOwned>(&self, dataset_id: &str) -> Result<Vec<T>> {
        let url = format!("{}/datasets/{dataset_id}/items", self.base_url);
        self.send_json(self.client.get(&url).query(&[("format", "json")]))
            .await
    }

    /// Run the reddit scraper end-to-end: start run, poll, fetch results.
    pub async fn run_reddit_scraper(&self, input: &RedditScraperInput) -> Result<Vec<RedditItem>> {
        let run = self.start_run(REDDIT_SCRAPER, input).await?;
        tracing::info!(run_id = %run.id, "Apify run started, polling for completion");

        let completed = self.wait_for_run(&run.id).await?;
        tracing::info!(
            run_id = %completed.id,
            dataset_id = %completed.default_dataset_id,
            "Run completed, fetching results"
        );

        let items: Vec<RedditItem> = self
            .get_dataset_items(&completed.default_dataset_id)
            .await?;
        tracing::info!(count = items.len(), "Fetched reddit dataset rows");

        Ok(items)
    }

    /// Search communities (subreddits) matching a query. Returns community rows only.
    pub async fn search_reddit_communities(&self, query: &str, limit: u32) -> Result<Vec<RedditItem>> {
        tracing::info!(query, limit, "Searching reddit communities");

        let input = RedditScraperInput {
            searches: vec![query.to_string()],
            search_communities: true,
            skip_comments: true,
            sort: "relevance".to_string(),
            max_items: limit,
            max_communities_count: limit,
            ..Default::default()
        };

        let rows = self.run_reddit_scraper(&input).await?;
        Ok(rows
            .into_iter()
            .filter(|r| r.is("community"))
            .take(limit as usize)
            .collect())
    }

    /// Hot posts of a subreddit with their comment rows.
    pub async fn scrape_subreddit_hot(
        &self,
        subreddit: &str,
        limit: u32,
        max_comments: u32,
    ) -> Result<Vec<RedditItem>> {
        tracing::info!(subreddit, limit, "Scraping subreddit hot listing");

        let input = RedditScraperInput {
            start_urls: vec![StartUrl {
                url: format!("https://www.reddit.com/r/{}/hot/", subreddit),
            }],
            sort: "hot".to_string(),
            max_items: limit.saturating_mul(max_comments.max(1) + 1),
            max_post_count: limit,
            max_comments,
            ..Default::default()
        };

        self.run_reddit_scraper(&input).await
    }

    /// Search inside one subreddit, with comment rows.
    pub async fn search_subreddit(
        &self,
        subreddit: &str,
        query: &str,
        limit: u32,
        time: &str,
        max_comments: u32,
    ) -> Result<Vec<RedditItem>> {
        tracing::info!(subreddit, query, limit, "Searching subreddit");

        let url = subreddit_search_url(subreddit, query, time)?;
        let input = RedditScraperInput {
            start_urls: vec![StartUrl { url }],
            sort: "hot".to_string(),
            time: Some(time.to_string()),
            max_items: limit.saturating_mul(max_comments.max(1) + 1),
            max_post_count: limit,
            max_comments,
            ..Default::default()
        };

        self.run_reddit_scraper(&input).await
    }
}

/// Reddit's in-subreddit search page for `query`, hot-sorted over `time`.
fn subreddit_search_url(subreddit: &str, query: &str, time: &str) -> Result<String> {
    let url = Url::parse_with_params(
        &format!("https://www.reddit.com/r/{subreddit}/search/"),
        &[("q", query), ("restrict_sr", "1"), ("sort", "hot"), ("t", time)],
    )?;
    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_escapes_the_query() {
        assert_eq!(
            subreddit_search_url("india", "budget & tax=high", "month").unwrap(),
            "https://www.reddit.com/r/india/search/?q=budget+%26+tax%3Dhigh&restrict_sr=1&sort=hot&t=month"
        );
        assert_eq!(
            subreddit_search_url("europe", "café", "week").unwrap(),
            "https://www.reddit.com/r/europe/search/?q=caf%C3%A9&restrict_sr=1&sort=hot&t=week"
        );
    }
}
