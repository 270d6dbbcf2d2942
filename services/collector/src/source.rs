use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{Result, TimeFilter};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Submission {
    pub id: String,
    pub title: String,
    pub url: String,
    pub score: i64,
    pub num_comments: u64,
    pub created_utc: f64,
    #[serde(default)]
    pub stickied: bool,
    #[serde(default)]
    pub over_18: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub body: String,
    pub score: i64,
    #[serde(default)]
    pub distinguished: Option<String>,
}

/// Where submissions, their comments and their images come from.
#[async_trait]
pub trait SubmissionSource: Send + Sync {
    async fn top_submissions(&self, time_filter: TimeFilter, limit: usize) -> Result<Vec<Submission>>;

    /// Top-level comments, best first.
    async fn top_comments(&self, submission_id: &str) -> Result<Vec<Comment>>;

    /// `Ok(None)` when the URL does not serve an image.
    async fn fetch_image(&self, url: &str) -> Result<Option<Bytes>>;
}
