//! Live output sinks for streamed tokens
//!
//! A sink sees every fragment the moment it is accumulated, in arrival
//! order. Sinks cannot fail: display problems must never abort a stream.

use std::io::Write;
use tokio::sync::mpsc::UnboundedSender;

/// Receives streamed fragments as they arrive
pub trait StreamSink: Send {
    /// Called once per non-empty fragment, in arrival order
    fn on_token(&mut self, token: &str);

    /// A previous attempt failed and attempt `attempt` (1-based) is starting.
    /// Anything shown for earlier attempts is stale.
    fn on_retry(&mut self, _attempt: u32) {}

    /// The stream ended normally
    fn on_complete(&mut self) {}
}

/// Writes tokens straight to stdout
#[derive(Debug, Default)]
pub struct StdoutSink;

impl StreamSink for StdoutSink {
    fn on_token(&mut self, token: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(token.as_bytes());
        let _ = stdout.flush();
    }

    fn on_retry(&mut self, attempt: u32) {
        println!("\n[retrying, attempt {}]", attempt);
    }

    fn on_complete(&mut self) {
        println!();
    }
}

/// Discards everything
#[derive(Debug, Default)]
pub struct NullSink;

impl StreamSink for NullSink {
    fn on_token(&mut self, _token: &str) {}
}

/// Events forwarded by `ChannelSink`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Token(String),
    Retry(u32),
    Complete,
}

/// Forwards tokens to an async consumer.
///
/// A dropped receiver is not an error; the stream keeps accumulating.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: UnboundedSender<SinkEvent>,
}

impl ChannelSink {
    pub fn new(tx: UnboundedSender<SinkEvent>) -> Self {
        Self { tx }
    }
}

impl StreamSink for ChannelSink {
    fn on_token(&mut self, token: &str) {
        let _ = self.tx.send(SinkEvent::Token(token.to_string()));
    }

    fn on_retry(&mut self, attempt: u32) {
        let _ = self.tx.send(SinkEvent::Retry(attempt));
    }

    fn on_complete(&mut self) {
        let _ = self.tx.send(SinkEvent::Complete);
    }
}
