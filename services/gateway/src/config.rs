use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::state::DEFAULT_MAX_UPLOAD_BYTES;

#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub model_base_url: String,
    pub model_id: String,
    pub model_api_key: Option<String>,
    pub request_timeout: Duration,

    pub image_cache_capacity: usize,
    pub image_cache_ttl: Duration,
    pub max_candidates: usize,
    pub max_upload_bytes: usize,

    pub bind_addr: String,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        let model_base_url = get("MODEL_BASE_URL")?;
        let model_id = std::env::var("MODEL_ID").unwrap_or_else(|_| "jasonlevy/roastme-model-v1".to_string());
        let model_api_key = std::env::var("MODEL_API_KEY").ok().filter(|k| !k.is_empty());
        let request_timeout = Duration::from_secs(parse_or("MODEL_TIMEOUT_SECS", 120)?);

        let image_cache_capacity = parse_or("IMAGE_CACHE_CAPACITY", 256)?;
        let image_cache_ttl = Duration::from_secs(parse_or("IMAGE_CACHE_TTL_SECS", 3600)?);
        let max_candidates = parse_or("MAX_CANDIDATES", 10)?;
        let max_upload_bytes = parse_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;

        let bind_addr = std::env::var("GATEWAY_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());

        if !model_base_url.starts_with("http://") && !model_base_url.starts_with("https://") {
            bail!("MODEL_BASE_URL must start with http:// or https://");
        }
        if image_cache_capacity == 0 {
            bail!("IMAGE_CACHE_CAPACITY must be at least 1");
        }

        Ok(Self {
            model_base_url: model_base_url.trim_end_matches('/').to_string(),
            model_id,
            model_api_key,
            request_timeout,
            image_cache_capacity,
            image_cache_ttl,
            max_candidates,
            max_upload_bytes,
            bind_addr,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_reports_key() {
        assert_eq!(parse_or("GATEWAY_TEST_UNSET_KEY", 7usize).unwrap(), 7);

        std::env::set_var("GATEWAY_TEST_UPLOAD_BYTES", "lots");
        let err = parse_or::<usize>("GATEWAY_TEST_UPLOAD_BYTES", 1).unwrap_err();
        assert!(err.to_string().starts_with("GATEWAY_TEST_UPLOAD_BYTES has an invalid value"));
    }
}
