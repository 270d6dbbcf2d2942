use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::{ClassifierProfile, ConversationSample, FilterStats, Reason};

/// Character-length summary of a set of texts.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LengthStats {
    pub count: usize,
    pub min: usize,
    pub max: usize,
    pub mean: f64,
    pub median: f64,
}

impl LengthStats {
    pub fn from_lengths(lengths: &[usize]) -> Option<Self> {
        if lengths.is_empty() {
            return None;
        }
        let mut sorted = lengths.to_vec();
        sorted.sort_unstable();

        let n = sorted.len();
        let sum: usize = sorted.iter().sum();
        let median = if n % 2 == 1 {
            sorted[n / 2] as f64
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) as f64 / 2.0
        };

        Some(Self {
            count: n,
            min: sorted[0],
            max: sorted[n - 1],
            mean: sum as f64 / n as f64,
            median,
        })
    }

    pub fn of_texts<'a>(texts: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        let lengths: Vec<usize> = texts.into_iter().map(|t| t.chars().count()).collect();
        Self::from_lengths(&lengths)
    }
}

/// Rough verdict on whether a kept set is large enough to fine-tune on.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Assessment {
    Insufficient,
    Marginal,
    Sufficient,
}

impl Assessment {
    pub fn for_count(kept: u64) -> Self {
        match kept {
            0..=299 => Assessment::Insufficient,
            300..=499 => Assessment::Marginal,
            _ => Assessment::Sufficient,
        }
    }
}

/// Summary written next to every filtered dataset.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FilterReport {
    pub profile: String,
    pub profile_version: u32,
    pub total: u64,
    pub cleaning_failed: u64,
    pub reasons: BTreeMap<Reason, u64>,
    pub kept: u64,
    pub survival_rate: f64,
    pub lengths: Option<LengthStats>,
    pub assessment: Assessment,
    /// blake3 over the kept samples, one compact JSON line each.
    pub dataset_hash: String,
}

impl FilterReport {
    pub fn build(profile: &ClassifierProfile, stats: &FilterStats, accepted: &[ConversationSample]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for sample in accepted {
            // Serializing plain strings and enums cannot fail.
            if let Ok(line) = serde_json::to_vec(sample) {
                hasher.update(&line);
            }
            hasher.update(b"\n");
        }

        Self {
            profile: profile.name.clone(),
            profile_version: profile.version,
            total: stats.total,
            cleaning_failed: stats.cleaning_failed,
            reasons: stats.reasons.clone(),
            kept: stats.kept(),
            survival_rate: stats.survival_rate(),
            lengths: LengthStats::of_texts(accepted.iter().filter_map(|s| s.response())),
            assessment: Assessment::for_count(stats.kept()),
            dataset_hash: hex::encode(hasher.finalize().as_bytes()),
        }
    }
}

/// Up to `n` items drawn with a generator seeded independently of any
/// partition, so previews never shift the train/validation split.
pub fn preview<T: Clone>(items: &[T], n: usize, seed: u64) -> Vec<T> {
    let mut rng = StdRng::seed_from_u64(seed);
    items.choose_multiple(&mut rng, n).cloned().collect()
}
