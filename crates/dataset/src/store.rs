use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{ConversationSample, RawRecord, Result};

#[derive(Clone, Debug, Default)]
pub struct LoadedRecords {
    pub records: Vec<RawRecord>,
    /// Malformed or invariant-breaking lines, as `(line_no, message)`.
    pub skipped: Vec<(usize, String)>,
}

/// Read a `training_data.jsonl` record store.
///
/// Lines that fail to parse or validate are logged and skipped; only a
/// missing or unreadable file is an error.
pub fn load_raw_records(path: &Path) -> Result<LoadedRecords> {
    let reader = BufReader::new(File::open(path)?);
    let mut out = LoadedRecords::default();

    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let record: RawRecord = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                warn!(line_no, error = %e, "skipping malformed record");
                out.skipped.push((line_no, format!("invalid JSON: {e}")));
                continue;
            }
        };
        if let Err(e) = record.validate() {
            warn!(line_no, error = %e, "skipping invalid record");
            out.skipped.push((line_no, e.to_string()));
            continue;
        }
        out.records.push(record);
    }
    Ok(out)
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    path.with_file_name(tmp_name)
}

fn write_tmp<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp_path = tmp_path_for(path);
    std::fs::write(&tmp_path, &bytes)?;
    Ok(tmp_path)
}

/// Write pretty JSON through a sibling temp file and rename it into place.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let tmp_path = write_tmp(path, value)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// A group of JSON outputs that land together.
///
/// Each [`stage`](StagedWrites::stage) writes a temp file next to its
/// target; [`commit`](StagedWrites::commit) renames them all into place.
/// Dropping without a commit removes whatever was staged.
#[derive(Debug, Default)]
pub struct StagedWrites {
    staged: Vec<(PathBuf, PathBuf)>,
}

impl StagedWrites {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage<T: Serialize + ?Sized>(&mut self, path: &Path, value: &T) -> Result<()> {
        let tmp_path = write_tmp(path, value)?;
        self.staged.push((tmp_path, path.to_path_buf()));
        Ok(())
    }

    pub fn commit(mut self) -> Result<()> {
        for (tmp_path, path) in std::mem::take(&mut self.staged) {
            std::fs::rename(&tmp_path, &path)?;
        }
        Ok(())
    }
}

impl Drop for StagedWrites {
    fn drop(&mut self) {
        for (tmp_path, _) in &self.staged {
            let _ = std::fs::remove_file(tmp_path);
        }
    }
}

pub fn write_samples(path: &Path, samples: &[ConversationSample]) -> Result<()> {
    write_json_atomic(path, samples)
}

pub fn read_samples(path: &Path) -> Result<Vec<ConversationSample>> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Unscored text corpus input: `{"roasts": [...]}`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct TextCorpus {
    pub roasts: Vec<String>,
}

impl TextCorpus {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Output of the text-only filter.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FilteredCorpus {
    pub source: String,
    pub filtering: String,
    pub total_raw: u64,
    pub total_kept: u64,
    pub survival_rate: f64,
    pub mean_length: f64,
    pub roasts: Vec<String>,
}
