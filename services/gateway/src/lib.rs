//! HTTP boundary in front of the fine-tuned roast model.
//!
//! Clients upload an image once and then ask for one or more roasts of it.
//! Images live in an injected [`ImageStore`]; text comes from an injected
//! [`RoastBackend`].

pub mod config;
pub mod prompt;
pub mod images;
pub mod backend;
pub mod routes;
pub mod state;

pub use config::GatewayConfig;
pub use images::{ImageStore, MemoryImageStore};
pub use backend::{GenerationParams, OpenAiBackend, RoastBackend};
pub use routes::router;
pub use state::{AppState, SharedState};
