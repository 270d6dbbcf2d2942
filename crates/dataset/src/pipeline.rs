use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{clean, Classifier, ConversationSample, RawRecord, Reason};

/// What happened to one candidate text. Every candidate gets exactly one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fate {
    CleaningFailed,
    Classified(Reason),
}

/// Per-fate counters. `total == cleaning_failed + sum(reasons)` always holds
/// for stats built through [`FilterStats::record`] and [`FilterStats::merge`].
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct FilterStats {
    pub total: u64,
    pub cleaning_failed: u64,
    pub reasons: BTreeMap<Reason, u64>,
}

impl FilterStats {
    pub fn record(&mut self, fate: Fate) {
        self.total += 1;
        match fate {
            Fate::CleaningFailed => self.cleaning_failed += 1,
            Fate::Classified(reason) => *self.reasons.entry(reason).or_insert(0) += 1,
        }
    }

    pub fn merge(&mut self, other: &FilterStats) {
        self.total += other.total;
        self.cleaning_failed += other.cleaning_failed;
        for (reason, n) in &other.reasons {
            *self.reasons.entry(*reason).or_insert(0) += n;
        }
    }

    pub fn count(&self, reason: Reason) -> u64 {
        self.reasons.get(&reason).copied().unwrap_or(0)
    }

    pub fn kept(&self) -> u64 {
        self.count(Reason::Valid)
    }

    pub fn is_total_partition(&self) -> bool {
        self.cleaning_failed + self.reasons.values().sum::<u64>() == self.total
    }

    /// Percentage of candidates kept.
    pub fn survival_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.kept() as f64 / self.total as f64 * 100.0
    }

    /// Removal counts by label, largest first.
    pub fn removal_breakdown(&self) -> Vec<(&'static str, u64)> {
        let mut out: Vec<(&'static str, u64)> = Reason::ALL
            .iter()
            .filter(|r| **r != Reason::Valid)
            .map(|r| (r.as_str(), self.count(*r)))
            .chain(std::iter::once(("cleaning_failed", self.cleaning_failed)))
            .filter(|(_, n)| *n > 0)
            .collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        out
    }
}

#[derive(Clone, Debug, Default)]
pub struct PipelineOutput {
    pub accepted: Vec<ConversationSample>,
    pub stats: FilterStats,
}

/// Cleaner followed by classifier, applied candidate by candidate.
#[derive(Clone, Debug)]
pub struct Pipeline {
    classifier: Classifier,
}

impl Pipeline {
    pub fn new(classifier: Classifier) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Clean and classify one text; the cleaned text is returned only when accepted.
    pub fn evaluate(&self, text: &str, score: i64) -> (Fate, Option<String>) {
        let Some(cleaned) = clean(text) else {
            return (Fate::CleaningFailed, None);
        };
        let verdict = self.classifier.classify(&cleaned, score);
        if verdict.accepted {
            (Fate::Classified(verdict.reason), Some(cleaned))
        } else {
            (Fate::Classified(verdict.reason), None)
        }
    }

    fn process_record(&self, record: &RawRecord) -> PipelineOutput {
        let mut out = PipelineOutput::default();
        for candidate in record.candidates() {
            let (fate, kept) = self.evaluate(candidate.text, candidate.score);
            out.stats.record(fate);
            match kept {
                Some(text) => out.accepted.push(ConversationSample::new(
                    candidate.sample_id(),
                    record.image_filename.clone(),
                    text,
                )),
                None => debug!(sample_id = %candidate.sample_id(), fate = ?fate, "candidate dropped"),
            }
        }
        out
    }

    pub fn run(&self, records: &[RawRecord]) -> PipelineOutput {
        let mut out = PipelineOutput::default();
        for record in records {
            let part = self.process_record(record);
            out.accepted.extend(part.accepted);
            out.stats.merge(&part.stats);
        }
        out
    }

    /// Same result as [`Pipeline::run`]; records are processed on the rayon
    /// pool with per-record counters merged in input order afterwards.
    pub fn run_parallel(&self, records: &[RawRecord]) -> PipelineOutput {
        let parts: Vec<PipelineOutput> = records
            .par_iter()
            .map(|record| self.process_record(record))
            .collect();

        let mut out = PipelineOutput::default();
        for part in parts {
            out.accepted.extend(part.accepted);
            out.stats.merge(&part.stats);
        }
        out
    }

    /// Filter an unscored corpus; kept texts come back cleaned, in input order.
    pub fn run_texts(&self, texts: &[String]) -> (Vec<String>, FilterStats) {
        let mut kept = Vec::new();
        let mut stats = FilterStats::default();
        for text in texts {
            let (fate, cleaned) = self.evaluate(text, 0);
            stats.record(fate);
            if let Some(c) = cleaned {
                kept.push(c);
            }
        }
        (kept, stats)
    }
}
