//! ollamastream - client library for a local Ollama server
//!
//! Streams chat answers token by token while reassembling the full text,
//! under retry, deadline and cancellation policies that never duplicate or
//! reorder output. Also provides structured-JSON chat and read access to
//! the model directory.
//!
//! # Architecture
//!
//! - `streaming`: transport, NDJSON decoder, accumulator, live sinks
//! - `policy`: bounded retry and wall-clock deadline
//! - `chat`: the logical chat call and the JSON responder
//! - `models`: model listing and introspection

pub mod errors;
pub mod types;
pub mod config;
pub mod streaming;
pub mod policy;
pub mod chat;
pub mod models;
pub mod cli;

// Re-export commonly used types
pub use chat::ChatClient;
pub use config::ClientConfig;
pub use errors::{ClientError, Result};
pub use models::{ModelDirectory, ModelInfo, ModelSummary};
pub use streaming::{ChannelSink, NullSink, StdoutSink, StreamSink};
pub use types::{ChatMessage, ChatResult, Role};
