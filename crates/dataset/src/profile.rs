use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{DatasetError, Result};

/// Rejection rule that only applies below a score cutoff.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SoftReject {
    pub below_score: i64,
    pub patterns: Vec<String>,
}

/// Tunable parameters of the quality classifier.
///
/// Patterns are regular expressions matched case-insensitively; feature
/// terms are plain substrings matched against the lowercased text.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ClassifierProfile {
    pub name: String,
    pub version: u32,
    pub min_len: usize,
    pub max_len: usize,
    /// `None` disables the score rule (unscored corpora).
    pub min_score: Option<i64>,
    pub reject_patterns: Vec<String>,
    #[serde(default)]
    pub soft_reject: Option<SoftReject>,
    pub comparison_patterns: Vec<String>,
    pub feature_terms: Vec<String>,
    pub min_features: usize,
    pub artifact_patterns: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

const FACE_AND_BODY: &[&str] = &[
    "face", "forehead", "fivehead", "hair", "hairline", "receding",
    "eye", "eyes", "nose", "mouth", "teeth", "smile", "smiling",
    "chin", "eyebrow", "eyebrows", "beard", "mustache",
    "head", "neck", "cheek", "cheeks", "jaw", "lips",
    "body", "arm", "arms", "hand", "hands",
];

const BASE_ARTIFACTS: &[&str] = &[
    r"http", r"www\.", r"\.com", r"imgur", r"reddit", r"subreddit", r"upvote",
    r"\b[ru]/\w+",
];

impl ClassifierProfile {
    /// Canonical profile: pattern blocklist plus comparison-or-features grounding.
    pub fn strict() -> Self {
        Self {
            name: "strict".into(),
            version: 3,
            min_len: 25,
            max_len: 150,
            min_score: Some(100),
            reject_patterns: strings(&[
                r"\bkarma\b", r"\bsubscribers?\b", r"\bharvard\b", r"\bcollege\b",
                r"\bi bet you\b", r"\byou probably\b", r"\bi heard\b",
                r"\bglad\b", r"\bcongrats?\b", r"\bgood job\b", r"\bnice\b",
                r"\bperfectly valid\b", r"\bwe care\b",
                r"\bthis time\b", r"\bupdated\b", r"\bagain\b", r"\bstill\b",
                r"\bvirgin\b", r"\bgirlfriend\b", r"\bboyfriend\b",
                r"\bjob\b", r"\bmoney\b", r"\brich\b", r"\bpoor\b",
            ]),
            soft_reject: None,
            comparison_patterns: strings(&[
                r"\blook like\b", r"\blooks like\b", r"\blooking like\b",
                r"\breminds? me of\b", r"\bresembles?\b",
                r"\bif .+ had a baby\b", r"\bif .+ and .+ had\b",
                r"\bknockoff\b", r"\bdollar store\b", r"\bwish\.com\b",
            ]),
            feature_terms: strings(FACE_AND_BODY),
            min_features: 2,
            artifact_patterns: strings(BASE_ARTIFACTS),
        }
    }

    /// Older keyword-count profile: wider bounds, lower threshold, one visual hit.
    pub fn lenient() -> Self {
        let features = strings(&[
            "hair", "face", "eye", "eyes", "nose", "mouth", "teeth", "smile", "smiling",
            "forehead", "chin", "eyebrow", "eyebrows", "beard", "mustache", "glasses", "head",
            "ear", "ears", "cheek", "cheeks", "jaw", "neck", "skin", "lips",
            "wearing", "shirt", "outfit", "clothes", "look", "looking", "looks",
            "body", "arm", "arms", "hand", "hands", "finger", "fingers",
            "tall", "short", "fat", "thin", "skinny", "big", "small", "ugly",
            "bald", "balding", "hairline", "hairy", "shaved", "curly", "greasy",
            "pretty", "handsome", "attractive", "beautiful",
            "pale", "dark", "bright", "color", "colored",
            "shaped", "round", "square", "long", "wide",
            "dude", "guy", "girl", "man", "woman", "boy",
            "fivehead", "receding",
            "giant", "tiny", "huge", "massive",
        ]);

        let mut artifacts = strings(BASE_ARTIFACTS);
        artifacts.extend(strings(&[r"edit:", r"thank", r"award", r"#\w+"]));

        Self {
            name: "lenient".into(),
            version: 2,
            min_len: 20,
            max_len: 200,
            min_score: Some(75),
            reject_patterns: strings(&[
                r"\bstay strong\b", r"\byou got this\b", r"\bgood luck\b",
                r"\bhope you\b", r"\bprayers\b",
            ]),
            soft_reject: Some(SoftReject {
                below_score: 100,
                patterns: strings(&[
                    r"\byou probably\b", r"\bi bet you\b", r"\byou must be\b",
                    r"\byou seem like\b", r"\byou're the type\b",
                ]),
            }),
            comparison_patterns: strings(&[
                r"\blook(?:s|ing|ed)? like\b", r"\bremind", r"\bresemble",
            ]),
            feature_terms: features,
            min_features: 1,
            artifact_patterns: artifacts,
        }
    }

    /// Strict rules without the score threshold, for corpora that carry no votes.
    pub fn text_only() -> Self {
        Self {
            name: "text-only".into(),
            min_score: None,
            ..Self::strict()
        }
    }

    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "strict" => Some(Self::strict()),
            "lenient" => Some(Self::lenient()),
            "text-only" => Some(Self::text_only()),
            _ => None,
        }
    }

    pub fn builtin_names() -> &'static [&'static str] {
        &["strict", "lenient", "text-only"]
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let profile: Self = serde_json::from_slice(&bytes)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_len > self.max_len {
            return Err(DatasetError::Config(format!(
                "profile {}: min_len {} exceeds max_len {}",
                self.name, self.min_len, self.max_len
            )));
        }
        if self.comparison_patterns.is_empty() && self.min_features == 0 {
            return Err(DatasetError::Config(format!(
                "profile {}: visual grounding needs comparison patterns or min_features > 0",
                self.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_validate() {
        for name in ClassifierProfile::builtin_names() {
            let p = ClassifierProfile::builtin(name).unwrap();
            p.validate().unwrap();
            assert_eq!(p.name, *name);
        }
        assert!(ClassifierProfile::builtin("medium").is_none());
    }

    #[test]
    fn test_text_only_drops_score_rule() {
        let p = ClassifierProfile::text_only();
        assert_eq!(p.min_score, None);
        assert_eq!(p.max_len, ClassifierProfile::strict().max_len);
    }

    #[test]
    fn test_profile_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        let mut p = ClassifierProfile::strict();
        p.name = "custom".into();
        p.min_score = Some(250);
        std::fs::write(&path, serde_json::to_vec_pretty(&p).unwrap()).unwrap();

        let loaded = ClassifierProfile::from_json_file(&path).unwrap();
        assert_eq!(loaded, p);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let mut p = ClassifierProfile::strict();
        p.min_len = 200;
        assert!(matches!(p.validate(), Err(DatasetError::Config(_))));
    }
}
