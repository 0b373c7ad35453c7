//! Ollama model directory
//!
//! Listing installed models and fetching metadata for one of them.

pub mod client;
pub mod types;

// Re-export key types for convenience
pub use client::ModelDirectory;
pub use types::{ModelInfo, ModelSummary, UNKNOWN};
