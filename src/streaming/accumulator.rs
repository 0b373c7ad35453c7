//! Per-call stream accumulator
//!
//! Folds decoded chunks into the full answer while forwarding each
//! fragment to a live sink. Driven by an explicit state machine:
//!
//! ```text
//! Idle       --Delta-->   Streaming
//! Streaming  --Delta-->   Streaming
//! Idle       --End-->     Finalizing
//! Streaming  --End-->     Finalizing
//! Finalizing --Resolve--> Done
//! Idle | Streaming | Finalizing --Error--> Failed
//! Done | Failed: terminal, every event ignored
//! ```
//!
//! The outcome is written exactly once, on entering Done or Failed.

use crate::errors::{ClientError, Result};
use crate::streaming::parser::DecodedChunk;
use crate::streaming::sink::StreamSink;
use crate::types::{ChatResult, StreamDelta};
use tracing::{debug, warn};

/// Accumulator states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamState {
    /// No record decoded yet
    Idle,

    /// At least one valid record seen
    Streaming,

    /// End of stream observed, result being built
    Finalizing,

    /// Resolved with a result (terminal)
    Done,

    /// Resolved with an error (terminal)
    Failed,
}

/// Events that drive the accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEvent {
    Delta,
    End,
    Resolve,
    Error,
}

impl StreamState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamState::Done | StreamState::Failed)
    }

    /// Next state, or `None` when the event is not accepted here
    pub fn transition(&self, event: StreamEvent) -> Option<StreamState> {
        use StreamEvent::*;
        use StreamState::*;

        match (self, event) {
            (Idle, Delta) | (Streaming, Delta) => Some(Streaming),
            (Idle, End) | (Streaming, End) => Some(Finalizing),
            (Finalizing, Resolve) => Some(Done),
            (Idle, Error) | (Streaming, Error) | (Finalizing, Error) => Some(Failed),
            _ => None,
        }
    }
}

/// Accumulates one attempt of a streamed chat
pub struct StreamAccumulator<'a, S: StreamSink + ?Sized> {
    state: StreamState,
    buffer: String,
    sink: &'a mut S,

    /// Non-empty fragments folded into the buffer
    fragments: usize,

    /// Records that decoded successfully (with or without text)
    decoded: usize,

    /// Records that failed to decode
    decode_failures: usize,

    outcome: Option<Result<ChatResult>>,
}

impl<'a, S: StreamSink + ?Sized> StreamAccumulator<'a, S> {
    pub fn new(sink: &'a mut S) -> Self {
        Self {
            state: StreamState::Idle,
            buffer: String::new(),
            sink,
            fragments: 0,
            decoded: 0,
            decode_failures: 0,
            outcome: None,
        }
    }

    /// Route one decoded record to the matching hook
    pub fn apply(&mut self, chunk: DecodedChunk) {
        match chunk {
            DecodedChunk::Delta(delta) => self.on_delta(delta),
            DecodedChunk::Control => self.on_control(),
            DecodedChunk::ServerError(message) => {
                self.on_error(ClientError::StreamingError(format!(
                    "server reported: {}",
                    message
                )))
            }
            DecodedChunk::Malformed(reason) => self.on_decode_failure(&reason),
        }
    }

    /// Append a fragment and forward it to the sink
    pub fn on_delta(&mut self, delta: StreamDelta) {
        let Some(next) = self.state.transition(StreamEvent::Delta) else {
            return;
        };
        self.state = next;
        self.decoded += 1;

        if !delta.content.is_empty() {
            self.buffer.push_str(&delta.content);
            self.sink.on_token(&delta.content);
            self.fragments += 1;
        }

        if delta.is_final {
            self.on_end();
        }
    }

    /// A valid record without text
    pub fn on_control(&mut self) {
        if let Some(next) = self.state.transition(StreamEvent::Delta) {
            self.state = next;
            self.decoded += 1;
        }
    }

    /// A record that could not be decoded; logged and skipped
    pub fn on_decode_failure(&mut self, reason: &str) {
        if self.state.is_terminal() {
            return;
        }
        self.decode_failures += 1;
        warn!(failures = self.decode_failures, "Skipping malformed chat chunk: {}", reason);
    }

    /// The body ended (or a final record arrived)
    pub fn on_end(&mut self) {
        let Some(next) = self.state.transition(StreamEvent::End) else {
            return;
        };
        self.state = next;

        if self.decoded == 0 && self.decode_failures > 0 {
            self.on_error(ClientError::MalformedStream {
                failures: self.decode_failures,
            });
            return;
        }

        let text = self.buffer.trim();
        let result = if text.is_empty() {
            ChatResult::empty()
        } else {
            ChatResult::success(text)
        };

        debug!(
            fragments = self.fragments,
            decode_failures = self.decode_failures,
            succeeded = result.succeeded,
            "Chat stream complete"
        );

        if let Some(done) = self.state.transition(StreamEvent::Resolve) {
            self.state = done;
            self.sink.on_complete();
            self.outcome = Some(Ok(result));
        }
    }

    /// Transport or server failure; resolves the attempt as failed
    pub fn on_error(&mut self, err: ClientError) {
        let Some(next) = self.state.transition(StreamEvent::Error) else {
            return;
        };
        self.state = next;
        self.outcome = Some(Err(err));
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn decode_failures(&self) -> usize {
        self.decode_failures
    }

    /// Consume the accumulator, yielding its single outcome
    pub fn into_outcome(self) -> Result<ChatResult> {
        self.outcome.unwrap_or_else(|| {
            Err(ClientError::StreamingError(
                "stream closed before a terminal event".to_string(),
            ))
        })
    }
}
