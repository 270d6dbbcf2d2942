use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{CollectorConfig, CollectorError, Comment, Result, Submission, SubmissionSource, TimeFilter};

const PAGE_SIZE: usize = 100;

#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    #[serde(default)]
    after: Option<String>,
    children: Vec<Thing>,
}

#[derive(Deserialize)]
struct Thing {
    kind: String,
    data: Value,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Reddit API client using application-only OAuth.
pub struct RedditSource {
    client: reqwest::Client,
    image_client: reqwest::Client,
    client_id: String,
    client_secret: String,
    auth_url: String,
    api_base: String,
    subreddit: String,
    token: Mutex<Option<String>>,
}

impl RedditSource {
    pub fn new(cfg: &CollectorConfig) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(cfg.user_agent.clone()).build()?;
        let image_client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0")
            .timeout(cfg.image_timeout)
            .build()?;
        Ok(Self {
            client,
            image_client,
            client_id: cfg.reddit_client_id.clone(),
            client_secret: cfg.reddit_client_secret.clone(),
            auth_url: cfg.auth_url.clone(),
            api_base: cfg.api_base.clone(),
            subreddit: cfg.subreddit.clone(),
            token: Mutex::new(None),
        })
    }

    async fn token(&self) -> Result<String> {
        let mut guard = self.token.lock().await;
        if let Some(t) = guard.as_ref() {
            return Ok(t.clone());
        }
        let resp: TokenResponse = self
            .client
            .post(&self.auth_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        *guard = Some(resp.access_token.clone());
        Ok(resp.access_token)
    }

    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value> {
        let token = self.token().await?;
        let resp = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;
        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            // token expired; the next call fetches a fresh one
            *self.token.lock().await = None;
        }
        Ok(resp.error_for_status()?.json().await?)
    }
}

/// Imgur page links serve HTML; the `.jpg` form serves the image.
pub fn normalize_image_url(url: &str) -> String {
    let lower = url.to_lowercase();
    if lower.contains("imgur") && ![".jpg", ".jpeg", ".png"].iter().any(|ext| lower.ends_with(ext)) {
        format!("{url}.jpg")
    } else {
        url.to_string()
    }
}

fn parse_comments(listings: Value) -> Result<Vec<Comment>> {
    let listings: Vec<Listing> = serde_json::from_value(listings)?;
    let Some(comments) = listings.into_iter().nth(1) else {
        return Err(CollectorError::Source("comment listing missing".into()));
    };
    Ok(comments
        .data
        .children
        .into_iter()
        .filter(|t| t.kind == "t1")
        .filter_map(|t| serde_json::from_value::<Comment>(t.data).ok())
        .collect())
}

#[async_trait]
impl SubmissionSource for RedditSource {
    async fn top_submissions(&self, time_filter: TimeFilter, limit: usize) -> Result<Vec<Submission>> {
        let url = format!("{}/r/{}/top", self.api_base, self.subreddit);
        let mut out: Vec<Submission> = Vec::with_capacity(limit);
        let mut after: Option<String> = None;

        while out.len() < limit {
            let mut query = vec![
                ("t", time_filter.as_str().to_string()),
                ("limit", PAGE_SIZE.min(limit - out.len()).to_string()),
                ("raw_json", "1".to_string()),
            ];
            if let Some(a) = &after {
                query.push(("after", a.clone()));
            }

            let listing: Listing = serde_json::from_value(self.get_json(&url, &query).await?)?;
            let page_len = listing.data.children.len();
            for thing in listing.data.children.into_iter().filter(|t| t.kind == "t3") {
                match serde_json::from_value::<Submission>(thing.data) {
                    Ok(s) => out.push(s),
                    Err(e) => warn!(error = %e, "unparseable submission"),
                }
            }
            debug!(loaded = out.len(), "submission page");

            after = listing.data.after;
            if after.is_none() || page_len == 0 {
                break;
            }
        }
        out.truncate(limit);
        Ok(out)
    }

    async fn top_comments(&self, submission_id: &str) -> Result<Vec<Comment>> {
        let url = format!("{}/comments/{}", self.api_base, submission_id);
        let query = [
            ("sort", "top".to_string()),
            ("depth", "1".to_string()),
            ("limit", "100".to_string()),
            ("raw_json", "1".to_string()),
        ];
        parse_comments(self.get_json(&url, &query).await?)
    }

    async fn fetch_image(&self, url: &str) -> Result<Option<Bytes>> {
        let url = normalize_image_url(url);
        let resp = self.image_client.get(&url).send().await?;
        if resp.status() != reqwest::StatusCode::OK {
            return Ok(None);
        }
        let is_image = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("image"))
            .unwrap_or(false);
        if !is_image {
            return Ok(None);
        }
        Ok(Some(resp.bytes().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_imgur_pages_get_extension() {
        assert_eq!(normalize_image_url("https://imgur.com/abc"), "https://imgur.com/abc.jpg");
        assert_eq!(normalize_image_url("https://i.imgur.com/abc.png"), "https://i.imgur.com/abc.png");
        assert_eq!(normalize_image_url("https://i.redd.it/x.jpeg"), "https://i.redd.it/x.jpeg");
    }

    #[test]
    fn test_parse_comments_skips_more_stubs() {
        let body = json!([
            {"kind": "Listing", "data": {"after": null, "children": [{"kind": "t3", "data": {"id": "p1"}}]}},
            {"kind": "Listing", "data": {"after": null, "children": [
                {"kind": "t1", "data": {"body": "Your forehead has a forecast", "score": 812, "distinguished": null}},
                {"kind": "t1", "data": {"body": "Rules reminder", "score": 5, "distinguished": "moderator"}},
                {"kind": "more", "data": {"count": 40, "children": ["a", "b"]}}
            ]}}
        ]);
        let comments = parse_comments(body).unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].score, 812);
        assert_eq!(comments[1].distinguished.as_deref(), Some("moderator"));
    }

    #[test]
    fn test_parse_comments_requires_second_listing() {
        let body = json!([{"kind": "Listing", "data": {"children": []}}]);
        assert!(matches!(parse_comments(body), Err(CollectorError::Source(_))));
    }
}
