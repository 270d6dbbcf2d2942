pub mod config;
pub mod source;
pub mod reddit;
pub mod tiers;
pub mod ledger;
pub mod store;
pub mod collect;

pub use config::CollectorConfig;
pub use source::{Comment, Submission, SubmissionSource};
pub use reddit::RedditSource;
pub use tiers::{default_tiers, load_tiers, Tier, TimeFilter};
pub use ledger::Ledger;
pub use store::{OutputLayout, RecordStore, Metadata};
pub use collect::{Collector, CollectOptions, CollectionSummary};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Dataset(#[from] dataset::DatasetError),

    #[error("Source error: {0}")]
    Source(String),
}

pub type Result<T> = std::result::Result<T, CollectorError>;
