use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use dataset::{load_raw_records, RawRecord};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::Result;

/// File locations under the collector output directory.
#[derive(Clone, Debug)]
pub struct OutputLayout {
    pub root: PathBuf,
    pub images_dir: PathBuf,
    pub store_path: PathBuf,
    pub ledger_path: PathBuf,
    pub metadata_path: PathBuf,
}

impl OutputLayout {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            images_dir: root.join("images"),
            store_path: root.join("training_data.jsonl"),
            ledger_path: root.join("collection_progress.json"),
            metadata_path: root.join("metadata.json"),
        }
    }

    pub fn create_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.images_dir)?;
        Ok(())
    }

    /// Delete ledger, images, record store and metadata.
    pub fn reset(&self) -> Result<()> {
        for path in [&self.ledger_path, &self.store_path, &self.metadata_path] {
            if path.exists() {
                std::fs::remove_file(path)?;
            }
        }
        if self.images_dir.exists() {
            for entry in std::fs::read_dir(&self.images_dir)? {
                let entry = entry?;
                if entry.file_type()?.is_file() {
                    std::fs::remove_file(entry.path())?;
                }
            }
        }
        info!(root = %self.root.display(), "collection reset");
        Ok(())
    }
}

/// Append-only NDJSON record store.
#[derive(Clone, Debug)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: &Path) -> Self {
        Self { path: path.to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single line and sync it to disk.
    pub fn append(&self, record: &RawRecord) -> Result<()> {
        record.validate()?;
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut f = OpenOptions::new().create(true).read(true).append(true).open(&self.path)?;
        // a torn last line from an earlier crash must not swallow this record
        let len = f.metadata()?.len();
        if len > 0 {
            let mut last = [0u8; 1];
            f.seek(SeekFrom::Start(len - 1))?;
            f.read_exact(&mut last)?;
            if last[0] != b'\n' {
                f.write_all(b"\n")?;
            }
        }
        f.write_all(line.as_bytes())?;
        f.sync_data()?;
        Ok(())
    }

    pub fn load(&self) -> Result<Vec<RawRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        Ok(load_raw_records(&self.path)?.records)
    }

    pub fn ids(&self) -> Result<Vec<String>> {
        Ok(self.load()?.into_iter().map(|r| r.id).collect())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Metadata {
    pub total_samples: usize,
    pub total_roasts: usize,
    pub avg_roasts_per_post: f64,
    pub collection_date: String,
    pub source: String,
    pub version: String,
    pub filters: serde_json::Value,
}

impl Metadata {
    pub fn summarize(records: &[RawRecord], source: &str) -> Self {
        let total_roasts: usize = records.iter().map(|r| r.roasts.len()).sum();
        let avg = if records.is_empty() {
            0.0
        } else {
            (total_roasts as f64 / records.len() as f64 * 100.0).round() / 100.0
        };
        Self {
            total_samples: records.len(),
            total_roasts,
            avg_roasts_per_post: avg,
            collection_date: chrono::Utc::now().to_rfc3339(),
            source: source.to_string(),
            version: "v1.0".to_string(),
            filters: json!({
                "min_submission_score": "50-500 (tiered)",
                "min_comment_score": "30-100 (tiered)",
                "min_roasts_per_post": 2
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, n: usize) -> RawRecord {
        RawRecord {
            id: id.into(),
            title: String::new(),
            url: String::new(),
            submission_score: 100,
            num_comments: 20,
            created_utc: 0.0,
            image_filename: Some(format!("{id}.jpg")),
            roasts: vec!["x".to_string(); n],
            roast_scores: vec![50; n],
            tier: "t".into(),
        }
    }

    #[test]
    fn test_append_recovers_from_torn_line() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(&dir.path().join("training_data.jsonl"));
        store.append(&record("a", 2)).unwrap();
        {
            let mut f = OpenOptions::new().append(true).open(store.path()).unwrap();
            f.write_all(br#"{"id":"torn","roa"#).unwrap();
        }
        store.append(&record("b", 3)).unwrap();

        assert_eq!(store.ids().unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_append_rejects_mismatched_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(&dir.path().join("s.jsonl"));
        let mut bad = record("a", 2);
        bad.roast_scores.pop();
        assert!(store.append(&bad).is_err());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_metadata_average_rounded() {
        let m = Metadata::summarize(&[record("a", 2), record("b", 3), record("c", 3)], "r/RoastMe");
        assert_eq!(m.total_samples, 3);
        assert_eq!(m.total_roasts, 8);
        assert_eq!(m.avg_roasts_per_post, 2.67);
        assert_eq!(Metadata::summarize(&[], "r/RoastMe").avg_roasts_per_post, 0.0);
    }

    #[test]
    fn test_reset_clears_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path());
        layout.create_dirs().unwrap();
        std::fs::write(layout.images_dir.join("a.jpg"), b"img").unwrap();
        std::fs::write(&layout.store_path, b"{}\n").unwrap();
        std::fs::write(&layout.ledger_path, b"{}").unwrap();

        layout.reset().unwrap();
        assert!(!layout.store_path.exists());
        assert!(!layout.ledger_path.exists());
        assert_eq!(std::fs::read_dir(&layout.images_dir).unwrap().count(), 0);
    }
}
