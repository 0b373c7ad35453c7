//! Scripted in-memory transport for exercising the chat pipeline

use crate::errors::{ClientError, Result};
use crate::streaming::{ByteStream, ChatTransport};
use crate::types::ChatRequest;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Behaviour of one attempt
pub(crate) enum Script {
    /// Opening the stream fails
    Refuse,

    /// Stream opens and never yields
    Hang,

    /// Fragments, then the body ends
    Body(Vec<&'static str>),

    /// Fragments, then a transport error
    BodyThenError(Vec<&'static str>, &'static str),

    /// Fragments, then silence
    BodyThenHang(Vec<&'static str>),

    /// Buffered reply for `chat_once`
    Reply(Value),
}

impl Script {
    pub(crate) fn body(fragments: &[&'static str]) -> Self {
        Script::Body(fragments.to_vec())
    }

    pub(crate) fn body_then_error(fragments: &[&'static str], error: &'static str) -> Self {
        Script::BodyThenError(fragments.to_vec(), error)
    }

    pub(crate) fn body_then_hang(fragments: &[&'static str]) -> Self {
        Script::BodyThenHang(fragments.to_vec())
    }
}

fn fragments(parts: Vec<&'static str>) -> impl futures_util::Stream<Item = Result<Bytes>> + Send {
    stream::iter(parts.into_iter().map(|p| Ok(Bytes::from_static(p.as_bytes()))))
}

/// Plays back one `Script` per request, in order
pub(crate) struct ScriptedTransport {
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<ChatRequest>>,
    opened: AtomicU32,
}

impl ScriptedTransport {
    pub(crate) fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            requests: Mutex::new(Vec::new()),
            opened: AtomicU32::new(0),
        }
    }

    /// Number of requests sent
    pub(crate) fn opened(&self) -> u32 {
        self.opened.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_script(&self, request: &ChatRequest) -> Option<Script> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        self.scripts.lock().unwrap().pop_front()
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn open_chat_stream(&self, request: &ChatRequest) -> Result<ByteStream> {
        let stream: ByteStream = match self.next_script(request) {
            Some(Script::Refuse) | None => {
                return Err(ClientError::StreamingError("connection refused".to_string()))
            }
            Some(Script::Hang) => Box::pin(stream::pending::<Result<Bytes>>()),
            Some(Script::Body(parts)) => Box::pin(fragments(parts)),
            Some(Script::BodyThenError(parts, error)) => Box::pin(
                fragments(parts)
                    .chain(stream::once(async move { Err(ClientError::StreamingError(error.to_string())) })),
            ),
            Some(Script::BodyThenHang(parts)) => Box::pin(fragments(parts).chain(stream::pending())),
            Some(Script::Reply(_)) => {
                return Err(ClientError::StreamingError("unexpected streamed request".to_string()))
            }
        };
        Ok(stream)
    }

    async fn chat_once(&self, request: &ChatRequest) -> Result<Value> {
        match self.next_script(request) {
            Some(Script::Reply(value)) => Ok(value),
            _ => Err(ClientError::ApiError {
                status: 500,
                message: "internal error".to_string(),
            }),
        }
    }
}
