use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::{ClassifierProfile, DatasetError, Result};

/// Outcome label of a classification; `Valid` is the only accepting one.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    TooShort,
    TooLong,
    LowScore,
    NonVisualContent,
    NotVisualEnough,
    HasArtifact,
    Valid,
}

impl Reason {
    pub const ALL: [Reason; 7] = [
        Reason::TooShort,
        Reason::TooLong,
        Reason::LowScore,
        Reason::NonVisualContent,
        Reason::NotVisualEnough,
        Reason::HasArtifact,
        Reason::Valid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::TooShort => "too_short",
            Reason::TooLong => "too_long",
            Reason::LowScore => "low_score",
            Reason::NonVisualContent => "non_visual_content",
            Reason::NotVisualEnough => "not_visual_enough",
            Reason::HasArtifact => "has_artifact",
            Reason::Valid => "valid",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Verdict {
    pub accepted: bool,
    pub reason: Reason,
}

impl Verdict {
    fn valid() -> Self {
        Self { accepted: true, reason: Reason::Valid }
    }

    fn reject(reason: Reason) -> Self {
        Self { accepted: false, reason }
    }
}

/// A [`ClassifierProfile`] with its patterns compiled.
#[derive(Clone, Debug)]
pub struct Classifier {
    profile: ClassifierProfile,
    reject: Vec<Regex>,
    soft_reject: Option<(i64, Vec<Regex>)>,
    comparisons: Vec<Regex>,
    features: Vec<String>,
    artifacts: Vec<Regex>,
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            RegexBuilder::new(p)
                .case_insensitive(true)
                .build()
                .map_err(|e| DatasetError::Pattern { pattern: p.clone(), message: e.to_string() })
        })
        .collect()
}

impl Classifier {
    pub fn new(profile: ClassifierProfile) -> Result<Self> {
        profile.validate()?;

        let reject = compile(&profile.reject_patterns)?;
        let soft_reject = match &profile.soft_reject {
            Some(soft) => Some((soft.below_score, compile(&soft.patterns)?)),
            None => None,
        };
        let comparisons = compile(&profile.comparison_patterns)?;
        let artifacts = compile(&profile.artifact_patterns)?;

        let mut features: Vec<String> = Vec::with_capacity(profile.feature_terms.len());
        for term in &profile.feature_terms {
            let term = term.to_lowercase();
            if !term.is_empty() && !features.contains(&term) {
                features.push(term);
            }
        }

        Ok(Self { profile, reject, soft_reject, comparisons, features, artifacts })
    }

    pub fn profile(&self) -> &ClassifierProfile {
        &self.profile
    }

    /// Decide keep/reject for a cleaned text.
    ///
    /// Rules run cheapest first and the first failing rule names the reason:
    /// length, score, blocklist, visual grounding, residual artifacts.
    pub fn classify(&self, text: &str, score: i64) -> Verdict {
        let len = text.chars().count();
        if len < self.profile.min_len {
            return Verdict::reject(Reason::TooShort);
        }
        if len > self.profile.max_len {
            return Verdict::reject(Reason::TooLong);
        }

        if let Some(min_score) = self.profile.min_score {
            if score < min_score {
                return Verdict::reject(Reason::LowScore);
            }
        }

        if self.reject.iter().any(|re| re.is_match(text)) {
            return Verdict::reject(Reason::NonVisualContent);
        }
        if let Some((below, patterns)) = &self.soft_reject {
            if score < *below && patterns.iter().any(|re| re.is_match(text)) {
                return Verdict::reject(Reason::NonVisualContent);
            }
        }

        if !self.is_visually_grounded(text) {
            return Verdict::reject(Reason::NotVisualEnough);
        }

        if self.artifacts.iter().any(|re| re.is_match(text)) {
            return Verdict::reject(Reason::HasArtifact);
        }

        Verdict::valid()
    }

    fn is_visually_grounded(&self, text: &str) -> bool {
        if self.comparisons.iter().any(|re| re.is_match(text)) {
            return true;
        }
        self.feature_count(text) >= self.profile.min_features && self.profile.min_features > 0
    }

    /// Number of distinct vocabulary terms present (substring match).
    pub fn feature_count(&self, text: &str) -> usize {
        let lower = text.to_lowercase();
        self.features.iter().filter(|f| lower.contains(f.as_str())).count()
    }
}
