//! Streaming chat pipeline
//!
//! Transport, incremental NDJSON decoder, per-call accumulator and live
//! output sinks.

pub mod accumulator;
pub mod client;
pub mod parser;
pub mod sink;

// Re-export commonly used types
pub use accumulator::{StreamAccumulator, StreamState};
pub use client::{ByteStream, ChatTransport, OllamaClient, DEFAULT_OLLAMA_URL};
pub use parser::{decode_chunk, ChunkDecoder, DecodedChunk, LineFramer, MAX_LINE_SIZE};
pub use sink::{ChannelSink, NullSink, SinkEvent, StdoutSink, StreamSink};
