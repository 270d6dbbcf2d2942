//! Roast dataset pipeline
//!
//! Cleans, filters and partitions collected (image, comment) pairs into the
//! conversational sample format consumed by vision-language fine-tuning.

mod schema;
mod clean;
mod classify;
mod profile;
mod partition;
mod pipeline;
mod report;
mod store;
mod stage1;

pub use schema::{
    RawRecord, CandidateText, ConversationSample, Turn, Speaker,
    IMAGE_TOKEN, ROAST_INSTRUCTION,
};
pub use clean::{clean, MIN_CLEAN_LEN, MIN_SURVIVAL_RATIO};
pub use classify::{Classifier, Reason, Verdict};
pub use profile::{ClassifierProfile, SoftReject};
pub use partition::{partition, Partition};
pub use pipeline::{Fate, FilterStats, Pipeline, PipelineOutput};
pub use report::{FilterReport, LengthStats, Assessment, preview};
pub use store::{
    load_raw_records, write_samples, read_samples, write_json_atomic,
    StagedWrites, TextCorpus, FilteredCorpus, LoadedRecords,
};
pub use stage1::{select_stage1, Stage1Options, Stage1Selection, LengthBucket};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid pattern {pattern}: {message}")]
    Pattern { pattern: String, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Record {id}: {message}")]
    Invariant { id: String, message: String },
}

pub type Result<T> = std::result::Result<T, DatasetError>;
