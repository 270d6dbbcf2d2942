use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

#[derive(Clone, Debug)]
pub struct CollectorConfig {
    pub reddit_client_id: String,
    pub reddit_client_secret: String,
    pub user_agent: String,
    pub subreddit: String,
    pub auth_url: String,
    pub api_base: String,

    pub output_dir: PathBuf,
    pub target_total: usize,
    pub request_delay: Duration,
    pub image_timeout: Duration,
}

impl CollectorConfig {
    pub fn from_env() -> Result<Self> {
        let reddit_client_id = get("REDDIT_CLIENT_ID")?;
        let reddit_client_secret = get("REDDIT_CLIENT_SECRET")?;
        let user_agent = std::env::var("REDDIT_USER_AGENT")
            .unwrap_or_else(|_| "RoastMe Data Collector v1.0".to_string());
        let subreddit = std::env::var("REDDIT_SUBREDDIT").unwrap_or_else(|_| "RoastMe".to_string());
        let auth_url = std::env::var("REDDIT_AUTH_URL")
            .unwrap_or_else(|_| "https://www.reddit.com/api/v1/access_token".to_string());
        let api_base = std::env::var("REDDIT_API_BASE")
            .unwrap_or_else(|_| "https://oauth.reddit.com".to_string());

        let output_dir = std::env::var("COLLECTOR_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/raw"));
        let target_total = parse_or("COLLECTOR_TARGET", 1000)?;
        let request_delay = Duration::from_millis(parse_or("COLLECTOR_DELAY_MS", 500)?);
        let image_timeout = Duration::from_secs(parse_or("COLLECTOR_IMAGE_TIMEOUT_SECS", 10)?);

        for (key, url) in [("REDDIT_AUTH_URL", &auth_url), ("REDDIT_API_BASE", &api_base)] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                bail!("{key} must start with http:// or https://");
            }
        }

        Ok(Self {
            reddit_client_id,
            reddit_client_secret,
            user_agent,
            subreddit,
            auth_url,
            api_base: api_base.trim_end_matches('/').to_string(),
            output_dir,
            target_total,
            request_delay,
            image_timeout,
        })
    }
}

fn get(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Missing required env var: {key}"))
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(v) => v
            .parse()
            .map_err(|e| anyhow::anyhow!("{key} has an invalid value: {e}")),
        Err(_) => Ok(default),
    }
}
