use anyhow::{bail, Context};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::prompt::{SYSTEM_MESSAGE, USER_PROMPT};

/// Sampling settings tuned for short, varied one-liners.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GenerationParams {
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub max_new_tokens: u32,
    pub repetition_penalty: f64,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.85,
            top_p: 0.9,
            top_k: 50,
            max_new_tokens: 80,
            repetition_penalty: 1.2,
        }
    }
}

#[async_trait]
pub trait RoastBackend: Send + Sync {
    /// One roast for the given image bytes.
    async fn roast(&self, image: &[u8], params: &GenerationParams) -> anyhow::Result<String>;
    fn model(&self) -> &str;
}

/// Best-effort MIME type from magic bytes; JPEG when unknown.
pub fn sniff_mime(image: &[u8]) -> &'static str {
    if image.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else if image.starts_with(b"GIF8") {
        "image/gif"
    } else if image.len() >= 12 && &image[..4] == b"RIFF" && &image[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "image/jpeg"
    }
}

/// Vision model served behind an OpenAI-compatible `/v1/chat/completions`.
pub struct OpenAiBackend {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl OpenAiBackend {
    pub fn new(base_url: String, model: String, api_key: Option<String>, timeout: std::time::Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { base_url, model, api_key, client })
    }

    fn request_body(&self, image: &[u8], params: &GenerationParams) -> serde_json::Value {
        let data_url = format!(
            "data:{};base64,{}",
            sniff_mime(image),
            general_purpose::STANDARD.encode(image)
        );
        json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_MESSAGE},
                {"role": "user", "content": [
                    {"type": "image_url", "image_url": {"url": data_url}},
                    {"type": "text", "text": USER_PROMPT}
                ]}
            ],
            "temperature": params.temperature,
            "top_p": params.top_p,
            "top_k": params.top_k,
            "max_tokens": params.max_new_tokens,
            "repetition_penalty": params.repetition_penalty
        })
    }
}

#[async_trait]
impl RoastBackend for OpenAiBackend {
    async fn roast(&self, image: &[u8], params: &GenerationParams) -> anyhow::Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let mut req = self.client.post(url).json(&self.request_body(image, params));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await?.error_for_status()?;
        let json: serde_json::Value = resp.json().await?;

        let text = json["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("")
            .trim()
            .to_string();
        if text.is_empty() {
            bail!("model returned no content");
        }
        Ok(text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_mime() {
        assert_eq!(sniff_mime(&[0xff, 0xd8, 0xff]), "image/jpeg");
        assert_eq!(sniff_mime(b"\x89PNG\r\n"), "image/png");
        assert_eq!(sniff_mime(b"RIFF\0\0\0\0WEBPVP8 "), "image/webp");
        assert_eq!(sniff_mime(b""), "image/jpeg");
    }

    #[test]
    fn test_request_body_carries_image_and_prompts() {
        let b = OpenAiBackend::new(
            "http://localhost:8001".into(),
            "roast-vl".into(),
            None,
            std::time::Duration::from_secs(5),
        )
        .unwrap();
        let body = b.request_body(b"\x89PNG", &GenerationParams::default());

        assert_eq!(body["model"], "roast-vl");
        assert_eq!(body["messages"][0]["content"], SYSTEM_MESSAGE);
        let url = body["messages"][1]["content"][0]["image_url"]["url"].as_str().unwrap();
        assert_eq!(url, "data:image/png;base64,iVBORw==");
        assert_eq!(body["messages"][1]["content"][1]["text"], USER_PROMPT);
        assert_eq!(body["max_tokens"], 80);
    }
}
