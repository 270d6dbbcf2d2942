use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::{ConversationSample, DatasetError, LengthStats, Result};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Stage1Options {
    pub num_samples: usize,
    pub min_len: usize,
    pub max_len: usize,
    pub seed: u64,
}

impl Default for Stage1Options {
    fn default() -> Self {
        Self { num_samples: 20_000, min_len: 25, max_len: 100, seed: 42 }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LengthBucket {
    pub low: usize,
    pub high: usize,
    pub count: usize,
}

#[derive(Clone, Debug)]
pub struct Stage1Selection {
    /// Texts inside the length window before sampling.
    pub eligible: usize,
    pub samples: Vec<ConversationSample>,
    pub lengths: Option<LengthStats>,
    pub buckets: Vec<LengthBucket>,
}

fn buckets_for(min_len: usize, max_len: usize) -> Vec<LengthBucket> {
    // 25-50 / 51-75 / 76-100 for the default window
    let mut out = Vec::new();
    let mut low = min_len;
    let mut high = min_len.max(50);
    while low <= max_len {
        let h = high.min(max_len);
        out.push(LengthBucket { low, high: h, count: 0 });
        if h == max_len {
            break;
        }
        low = h + 1;
        high = h.saturating_add(25);
    }
    out
}

/// Pick a short, text-only warm-up set from an already filtered corpus.
///
/// When fewer than `num_samples` texts are eligible all of them are used in
/// input order; otherwise a seeded sample is drawn.
pub fn select_stage1(texts: &[String], opts: &Stage1Options) -> Result<Stage1Selection> {
    if opts.min_len > opts.max_len {
        return Err(DatasetError::Config(format!(
            "stage1 min_len {} exceeds max_len {}",
            opts.min_len, opts.max_len
        )));
    }

    let eligible: Vec<&String> = texts
        .iter()
        .filter(|t| (opts.min_len..=opts.max_len).contains(&t.chars().count()))
        .collect();

    let chosen: Vec<&String> = if eligible.len() <= opts.num_samples {
        eligible.clone()
    } else {
        let mut rng = StdRng::seed_from_u64(opts.seed);
        eligible.choose_multiple(&mut rng, opts.num_samples).copied().collect()
    };

    // buckets stop at the longest chosen text
    let longest = chosen.iter().map(|t| t.chars().count()).max().unwrap_or(opts.min_len);
    let mut buckets = buckets_for(opts.min_len, opts.max_len.min(longest.max(opts.min_len)));
    for text in &chosen {
        let len = text.chars().count();
        if let Some(b) = buckets.iter_mut().find(|b| (b.low..=b.high).contains(&len)) {
            b.count += 1;
        }
    }

    let samples = chosen
        .iter()
        .enumerate()
        .map(|(i, text)| ConversationSample::new(format!("hf_stage1_{i}"), None, text.as_str()))
        .collect();

    Ok(Stage1Selection {
        eligible: eligible.len(),
        lengths: LengthStats::of_texts(chosen.iter().map(|t| t.as_str())),
        samples,
        buckets,
    })
}
