use serde::{Deserialize, Serialize};

use crate::{DatasetError, Result};

/// Placeholder the training runtime swaps for image features.
pub const IMAGE_TOKEN: &str = "<image>";

pub const ROAST_INSTRUCTION: &str = "Roast this person based on their appearance.";

/// One collected submission as stored in `training_data.jsonl`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RawRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub submission_score: i64,
    #[serde(default)]
    pub num_comments: u64,
    #[serde(default)]
    pub created_utc: f64,
    #[serde(default)]
    pub image_filename: Option<String>,
    pub roasts: Vec<String>,
    pub roast_scores: Vec<i64>,
    #[serde(default)]
    pub tier: String,
}

impl RawRecord {
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(DatasetError::Invariant {
                id: self.id.clone(),
                message: "empty id".into(),
            });
        }
        if self.roasts.len() != self.roast_scores.len() {
            return Err(DatasetError::Invariant {
                id: self.id.clone(),
                message: format!(
                    "{} roasts but {} roast_scores",
                    self.roasts.len(),
                    self.roast_scores.len()
                ),
            });
        }
        Ok(())
    }

    pub fn candidates(&self) -> impl Iterator<Item = CandidateText<'_>> {
        self.roasts
            .iter()
            .zip(self.roast_scores.iter())
            .enumerate()
            .map(move |(index, (text, score))| CandidateText {
                record_id: &self.id,
                index,
                text,
                score: *score,
            })
    }
}

/// A single (text, score) pair addressed by `(record_id, index)`.
#[derive(Clone, Copy, Debug)]
pub struct CandidateText<'a> {
    pub record_id: &'a str,
    pub index: usize,
    pub text: &'a str,
    pub score: i64,
}

impl CandidateText<'_> {
    pub fn sample_id(&self) -> String {
        format!("{}_r{}", self.record_id, self.index)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Human,
    Gpt,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    pub from: Speaker,
    pub value: String,
}

/// Final persisted training unit (LLaVA conversation layout).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationSample {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub conversations: Vec<Turn>,
}

impl ConversationSample {
    pub fn new(id: impl Into<String>, image: Option<String>, response: impl Into<String>) -> Self {
        let prompt = match image {
            Some(_) => format!("{IMAGE_TOKEN}\n{ROAST_INSTRUCTION}"),
            None => ROAST_INSTRUCTION.to_string(),
        };
        Self {
            id: id.into(),
            image,
            conversations: vec![
                Turn { from: Speaker::Human, value: prompt },
                Turn { from: Speaker::Gpt, value: response.into() },
            ],
        }
    }

    /// The target response (first gpt turn).
    pub fn response(&self) -> Option<&str> {
        self.conversations
            .iter()
            .find(|t| t.from == Speaker::Gpt)
            .map(|t| t.value.as_str())
    }
}
