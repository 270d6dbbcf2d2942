use std::sync::Arc;

use crate::{GenerationParams, ImageStore, RoastBackend};

/// Request body cap when none is configured.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub images: Arc<dyn ImageStore>,
    pub backend: Arc<dyn RoastBackend>,
    pub params: GenerationParams,
    pub max_candidates: usize,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(images: Arc<dyn ImageStore>, backend: Arc<dyn RoastBackend>, max_candidates: usize) -> Self {
        Self {
            images,
            backend,
            params: GenerationParams::default(),
            max_candidates,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }
}
