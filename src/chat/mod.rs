//! Chat client
//!
//! One logical chat call runs as:
//!
//! ```text
//! deadline( retry( attempt ) )
//! attempt = transport -> ChunkDecoder -> StreamAccumulator -> sink
//! ```
//!
//! Each attempt owns a fresh decoder and accumulator, so text from a failed
//! attempt never leaks into the result of a later one. At most one response
//! body is open per call at any time.

pub mod json;

#[cfg(test)]
pub(crate) mod testing;

use crate::config::ClientConfig;
use crate::errors::{ClientError, Result};
use crate::policy::{Deadline, RetryPolicy};
use crate::streaming::{ChatTransport, ChunkDecoder, OllamaClient, StreamAccumulator, StreamSink};
use crate::types::{ChatMessage, ChatRequest, ChatResult};
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

/// Streaming chat client over a `ChatTransport`
#[derive(Debug, Clone)]
pub struct ChatClient<T = OllamaClient> {
    transport: T,
    config: ClientConfig,
    retry: RetryPolicy,
    deadline: Deadline,
}

impl ChatClient<OllamaClient> {
    /// Create a client talking HTTP to `config.host`
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = OllamaClient::with_base_url(&config.host)?;
        Ok(Self::with_transport(transport, config))
    }

    /// Check if the server is reachable
    pub async fn health_check(&self) -> bool {
        self.transport.health_check().await
    }
}

impl<T: ChatTransport> ChatClient<T> {
    pub fn with_transport(transport: T, config: ClientConfig) -> Self {
        let retry = config.retry_policy();
        let deadline = config.deadline();
        Self {
            transport,
            config,
            retry,
            deadline,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Streamed chat under the retry and deadline policies
    pub async fn stream_chat<S>(&self, messages: &[ChatMessage], sink: &mut S) -> Result<ChatResult>
    where
        S: StreamSink + ?Sized,
    {
        self.stream_chat_with_cancel(messages, sink, CancellationToken::new())
            .await
    }

    /// Like `stream_chat`, but the caller may abort the call through
    /// `cancel` at any point
    pub async fn stream_chat_with_cancel<S>(
        &self,
        messages: &[ChatMessage],
        sink: &mut S,
        cancel: CancellationToken,
    ) -> Result<ChatResult>
    where
        S: StreamSink + ?Sized,
    {
        let request = self.streaming_request(messages)?;
        let span = info_span!("chat", call_id = %Uuid::new_v4(), model = %request.model);

        async {
            let result = self
                .deadline
                .run(&cancel, self.run_with_retry(&request, sink, &cancel))
                .await;
            if let Ok(done) = &result {
                info!(succeeded = done.succeeded, chars = done.full_text.len(), "Chat complete");
            }
            result
        }
        .instrument(span)
        .await
    }

    /// A single streamed attempt under the deadline, without retry
    pub async fn chat<S>(&self, messages: &[ChatMessage], sink: &mut S) -> Result<ChatResult>
    where
        S: StreamSink + ?Sized,
    {
        let request = self.streaming_request(messages)?;
        let cancel = CancellationToken::new();
        let span = info_span!("chat", call_id = %Uuid::new_v4(), model = %request.model);

        self.deadline
            .run(&cancel, self.run_attempt(&request, sink, &cancel))
            .instrument(span)
            .await
    }

    /// Stream the answer to a single user prompt
    pub async fn generate_completion<S>(&self, prompt: &str, sink: &mut S) -> Result<ChatResult>
    where
        S: StreamSink + ?Sized,
    {
        if prompt.trim().is_empty() {
            return Err(ClientError::InvalidInput(
                "prompt must not be empty".to_string(),
            ));
        }
        self.stream_chat(&[ChatMessage::user(prompt)], sink).await
    }

    fn streaming_request(&self, messages: &[ChatMessage]) -> Result<ChatRequest> {
        let request = ChatRequest::streaming(
            self.config.model.clone(),
            messages.to_vec(),
            self.config.options.clone(),
        );
        request.validate()?;
        Ok(request)
    }

    async fn run_with_retry<S>(
        &self,
        request: &ChatRequest,
        sink: &mut S,
        cancel: &CancellationToken,
    ) -> Result<ChatResult>
    where
        S: StreamSink + ?Sized,
    {
        let mut retrying = self.retry.start();
        loop {
            let attempt = retrying.attempt();
            if attempt > 1 {
                sink.on_retry(attempt);
            }
            debug!(attempt, "Starting chat attempt");

            match self.run_attempt(request, sink, cancel).await {
                Ok(result) => return Ok(result),
                Err(e) => retrying.failed(e, cancel).await?,
            }
        }
    }

    /// Open one response body and pump it to completion
    async fn run_attempt<S>(
        &self,
        request: &ChatRequest,
        sink: &mut S,
        cancel: &CancellationToken,
    ) -> Result<ChatResult>
    where
        S: StreamSink + ?Sized,
    {
        let mut stream = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ClientError::Cancelled),
            opened = self.transport.open_chat_stream(request) => opened?,
        };

        let mut decoder = ChunkDecoder::new();
        let mut accumulator = StreamAccumulator::new(sink);

        while !accumulator.is_finished() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => accumulator.on_error(ClientError::Cancelled),
                next = stream.next() => match next {
                    Some(Ok(bytes)) => {
                        for chunk in decoder.push(&bytes) {
                            accumulator.apply(chunk);
                        }
                    }
                    Some(Err(e)) => accumulator.on_error(e),
                    None => {
                        if let Some(chunk) = decoder.finish() {
                            accumulator.apply(chunk);
                        }
                        accumulator.on_end();
                    }
                },
            }
        }

        // Release the body before handing back the outcome
        drop(stream);
        accumulator.into_outcome()
    }
}
