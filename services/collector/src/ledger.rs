use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Result;

#[derive(Serialize, Deserialize)]
struct LedgerFile {
    processed_ids: Vec<String>,
    #[serde(default)]
    last_updated: Option<String>,
}

/// Durable set of submission IDs whose records are already in the store.
///
/// An ID is only inserted after its record has been appended, so a crash
/// between flushes can at worst forget completed work, which the startup
/// reconcile against the store recovers.
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    ids: BTreeSet<String>,
    dirty: bool,
}

impl Ledger {
    pub fn load(path: &Path) -> Result<Self> {
        let ids = if path.exists() {
            let bytes = std::fs::read(path)?;
            let file: LedgerFile = serde_json::from_slice(&bytes)?;
            file.processed_ids.into_iter().collect()
        } else {
            BTreeSet::new()
        };
        Ok(Self { path: path.to_path_buf(), ids, dirty: false })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn insert(&mut self, id: impl Into<String>) {
        if self.ids.insert(id.into()) {
            self.dirty = true;
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Add IDs found in the record store; returns how many were missing.
    pub fn reconcile<I: IntoIterator<Item = String>>(&mut self, stored: I) -> usize {
        let before = self.ids.len();
        for id in stored {
            self.insert(id);
        }
        self.ids.len() - before
    }

    /// Atomically persist when anything changed since the last save.
    pub fn save(&mut self) -> Result<()> {
        if !self.dirty && self.path.exists() {
            return Ok(());
        }
        let file = LedgerFile {
            processed_ids: self.ids.iter().cloned().collect(),
            last_updated: Some(chrono::Utc::now().to_rfc3339()),
        };
        dataset::write_json_atomic(&self.path, &file)?;
        self.dirty = false;
        debug!(path = %self.path.display(), ids = self.ids.len(), "ledger saved");
        Ok(())
    }

    pub fn clear(&mut self) -> Result<()> {
        self.ids.clear();
        self.dirty = false;
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}
