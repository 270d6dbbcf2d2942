use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimeFilter {
    Hour,
    Day,
    Week,
    Month,
    Year,
    All,
}

impl TimeFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFilter::Hour => "hour",
            TimeFilter::Day => "day",
            TimeFilter::Week => "week",
            TimeFilter::Month => "month",
            TimeFilter::Year => "year",
            TimeFilter::All => "all",
        }
    }
}

/// One pass over a top listing with its own quality bars.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Tier {
    pub name: String,
    pub time_filter: TimeFilter,
    pub limit: usize,
    pub min_comment_score: i64,
    pub min_submission_score: i64,
    pub min_comments: u64,
    pub min_roasts: usize,
}

fn tier(
    name: &str,
    time_filter: TimeFilter,
    limit: usize,
    min_comment_score: i64,
    min_submission_score: i64,
    min_comments: u64,
    min_roasts: usize,
) -> Tier {
    Tier {
        name: name.to_string(),
        time_filter,
        limit,
        min_comment_score,
        min_submission_score,
        min_comments,
        min_roasts,
    }
}

pub fn default_tiers() -> Vec<Tier> {
    vec![
        tier("Tier 1: All-Time Legends (500+)", TimeFilter::All, 1000, 100, 500, 30, 3),
        tier("Tier 2: All-Time Strong (200-500)", TimeFilter::All, 1000, 75, 200, 25, 3),
        tier("Tier 3: All-Time Solid (100-200)", TimeFilter::All, 1500, 50, 100, 20, 2),
        tier("Tier 4: All-Time Decent (50-100)", TimeFilter::All, 1500, 40, 50, 15, 2),
        tier("Tier 5: Past Year Top", TimeFilter::Year, 1000, 50, 100, 15, 2),
        tier("Tier 6: Past Month Fresh", TimeFilter::Month, 500, 30, 50, 10, 2),
    ]
}

/// Tier list from a JSON array, replacing the defaults.
pub fn load_tiers(path: &Path) -> Result<Vec<Tier>> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tiers_descend() {
        let tiers = default_tiers();
        assert_eq!(tiers.len(), 6);
        assert_eq!(tiers[0].min_submission_score, 500);
        assert_eq!(tiers[5].time_filter, TimeFilter::Month);
        assert!(tiers.iter().all(|t| t.min_roasts >= 2));
    }

    #[test]
    fn test_tiers_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiers.json");
        std::fs::write(
            &path,
            r#"[{"name":"quick","time_filter":"week","limit":50,"min_comment_score":10,
                "min_submission_score":20,"min_comments":5,"min_roasts":1}]"#,
        )
        .unwrap();
        let tiers = load_tiers(&path).unwrap();
        assert_eq!(tiers[0].time_filter.as_str(), "week");
        assert_eq!(tiers[0].limit, 50);
    }
}
