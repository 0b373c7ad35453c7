//! Incremental decoder for newline-delimited JSON chat streams
//!
//! The server writes one JSON object per line, but the transport hands us
//! arbitrary byte fragments: a record may be split across fragments and a
//! fragment may carry several records. Decoding happens in two steps:
//! - `LineFramer` re-frames bytes into complete lines (bounded at 1MB)
//! - `decode_chunk` turns one line into at most one `StreamDelta`
//!
//! Neither step ever fails the stream. Bad input is reported as
//! `DecodedChunk::Malformed` and the caller decides what to do with it.

use crate::types::StreamDelta;
use serde::Deserialize;

/// Maximum size of a single pending record (1MB)
pub const MAX_LINE_SIZE: usize = 1_048_576;

/// Outcome of decoding a single record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedChunk {
    /// Carries text, a final marker, or both
    Delta(StreamDelta),

    /// Valid record with no text (status records, keep-alives)
    Control,

    /// The server reported a failure inside the stream
    ServerError(String),

    /// Record could not be interpreted; the stream continues
    Malformed(String),
}

#[derive(Debug, Deserialize)]
struct WireChunk {
    #[serde(default)]
    message: Option<WireMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Decode one record of the chat stream
pub fn decode_chunk(fragment: &[u8]) -> DecodedChunk {
    let text = match std::str::from_utf8(fragment) {
        Ok(text) => text.trim(),
        Err(e) => return DecodedChunk::Malformed(format!("invalid UTF-8: {}", e)),
    };

    if text.is_empty() {
        return DecodedChunk::Control;
    }

    let chunk: WireChunk = match serde_json::from_str(text) {
        Ok(chunk) => chunk,
        Err(e) => return DecodedChunk::Malformed(e.to_string()),
    };

    if let Some(error) = chunk.error {
        return DecodedChunk::ServerError(error);
    }

    let content = chunk
        .message
        .and_then(|m| m.content)
        .unwrap_or_default();

    if content.is_empty() && !chunk.done {
        return DecodedChunk::Control;
    }

    DecodedChunk::Delta(StreamDelta::new(content, chunk.done))
}

/// A complete line, or notice that one was dropped for being too large
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Line(Vec<u8>),
    Overflow(usize),
}

/// Splits a byte stream into newline-terminated records
#[derive(Debug)]
pub struct LineFramer {
    /// Bytes of the record currently being assembled
    buffer: Vec<u8>,

    /// Maximum size of a pending record
    max_line_size: usize,

    /// Skipping the remainder of an oversized record
    discarding: bool,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::with_capacity(MAX_LINE_SIZE)
    }

    pub fn with_capacity(max_line_size: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            max_line_size,
            discarding: false,
        }
    }

    /// Feed one transport fragment, returning every line it completes
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Frame> {
        let mut frames = Vec::new();
        let mut rest = bytes;

        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            let (head, tail) = rest.split_at(pos);
            rest = &tail[1..];

            if self.discarding {
                self.discarding = false;
                continue;
            }

            let size = self.buffer.len() + head.len();
            if size > self.max_line_size {
                self.buffer.clear();
                frames.push(Frame::Overflow(size));
                continue;
            }

            self.buffer.extend_from_slice(head);
            if let Some(line) = self.take_line() {
                frames.push(line);
            }
        }

        if !self.discarding && !rest.is_empty() {
            let size = self.buffer.len() + rest.len();
            if size > self.max_line_size {
                self.buffer.clear();
                self.discarding = true;
                frames.push(Frame::Overflow(size));
            } else {
                self.buffer.extend_from_slice(rest);
            }
        }

        frames
    }

    /// Flush a final record that was not newline-terminated
    pub fn finish(&mut self) -> Option<Frame> {
        if self.discarding {
            self.discarding = false;
            self.buffer.clear();
            return None;
        }
        self.take_line()
    }

    /// Number of bytes waiting for a newline
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    fn take_line(&mut self) -> Option<Frame> {
        let line = std::mem::take(&mut self.buffer);
        if line.iter().all(u8::is_ascii_whitespace) {
            return None;
        }
        Some(Frame::Line(line))
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

/// Framing and decoding for one chat stream
#[derive(Debug, Default)]
pub struct ChunkDecoder {
    framer: LineFramer,
}

impl ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(max_line_size: usize) -> Self {
        Self {
            framer: LineFramer::with_capacity(max_line_size),
        }
    }

    /// Decode every record completed by this fragment
    pub fn push(&mut self, bytes: &[u8]) -> Vec<DecodedChunk> {
        let max = self.framer.max_line_size;
        self.framer
            .push(bytes)
            .into_iter()
            .map(|frame| Self::decode_frame(frame, max))
            .collect()
    }

    /// Decode whatever is left once the body has ended
    pub fn finish(&mut self) -> Option<DecodedChunk> {
        let max = self.framer.max_line_size;
        self.framer.finish().map(|frame| Self::decode_frame(frame, max))
    }

    fn decode_frame(frame: Frame, max: usize) -> DecodedChunk {
        match frame {
            Frame::Line(line) => decode_chunk(&line),
            Frame::Overflow(size) => DecodedChunk::Malformed(format!(
                "record of {} bytes exceeds maximum {}",
                size, max
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(content: &str, is_final: bool) -> DecodedChunk {
        DecodedChunk::Delta(StreamDelta::new(content, is_final))
    }

    #[test]
    fn test_decode_content_chunk() {
        let chunk = br#"{"model":"llama3","message":{"role":"assistant","content":"Hel"},"done":false}"#;
        assert_eq!(decode_chunk(chunk), delta("Hel", false));
    }

    #[test]
    fn test_decode_final_chunk() {
        let chunk = br#"{"message":{"role":"assistant","content":""},"done":true,"eval_count":42}"#;
        assert_eq!(decode_chunk(chunk), delta("", true));
    }

    #[test]
    fn test_decode_chunk_without_content_is_control() {
        assert_eq!(decode_chunk(br#"{"status":"loading model"}"#), DecodedChunk::Control);
        assert_eq!(decode_chunk(br#"{"message":{"role":"assistant"}}"#), DecodedChunk::Control);
        assert_eq!(decode_chunk(b"   \r"), DecodedChunk::Control);
    }

    #[test]
    fn test_decode_server_error() {
        let chunk = br#"{"error":"model runner has unexpectedly stopped"}"#;
        assert_eq!(
            decode_chunk(chunk),
            DecodedChunk::ServerError("model runner has unexpectedly stopped".to_string())
        );
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(decode_chunk(b"{\"message\":"), DecodedChunk::Malformed(_)));
        assert!(matches!(decode_chunk(b"ping"), DecodedChunk::Malformed(_)));
        assert!(matches!(decode_chunk(b"42"), DecodedChunk::Malformed(_)));
        assert!(matches!(decode_chunk(&[0xff, 0xfe]), DecodedChunk::Malformed(_)));
    }

    #[test]
    fn test_framer_reassembles_split_record() {
        let mut framer = LineFramer::new();

        assert!(framer.push(br#"{"message":{"con"#).is_empty());
        assert!(framer.pending() > 0);

        let frames = framer.push(b"tent\":\"hi\"}}\n");
        assert_eq!(frames, vec![Frame::Line(br#"{"message":{"content":"hi"}}"#.to_vec())]);
        assert_eq!(framer.pending(), 0);
    }

    #[test]
    fn test_framer_multiple_records_in_one_fragment() {
        let mut framer = LineFramer::new();
        let frames = framer.push(b"{\"a\":1}\n{\"b\":2}\n{\"c\"");

        assert_eq!(frames.len(), 2);
        assert_eq!(framer.finish(), Some(Frame::Line(b"{\"c\"".to_vec())));
    }

    #[test]
    fn test_framer_skips_blank_lines() {
        let mut framer = LineFramer::new();
        let frames = framer.push(b"\n\r\n{\"a\":1}\r\n\n");
        assert_eq!(frames, vec![Frame::Line(b"{\"a\":1}\r".to_vec())]);
        assert_eq!(framer.finish(), None);
    }

    #[test]
    fn test_framer_overflow_discards_record_only() {
        let mut framer = LineFramer::with_capacity(16);

        let frames = framer.push(&[b'a'; 20]);
        assert_eq!(frames, vec![Frame::Overflow(20)]);

        // remainder of the oversized record is dropped, the next one survives
        let frames = framer.push(b"aaaa\n{\"x\":1}\n");
        assert_eq!(frames, vec![Frame::Line(b"{\"x\":1}".to_vec())]);
    }

    #[test]
    fn test_decoder_tolerates_garbage_between_records() {
        let mut decoder = ChunkDecoder::new();
        let body = concat!(
            "{\"message\":{\"content\":\"The \"}}\n",
            "not json at all\n",
            "{\"message\":{\"content\":\"sky\"}}\n",
        );

        let chunks = decoder.push(body.as_bytes());
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], delta("The ", false));
        assert!(matches!(chunks[1], DecodedChunk::Malformed(_)));
        assert_eq!(chunks[2], delta("sky", false));
    }

    #[test]
    fn test_decoder_finish_decodes_unterminated_record() {
        let mut decoder = ChunkDecoder::new();
        assert!(decoder.push(br#"{"message":{"content":"end"},"done":true}"#).is_empty());
        assert_eq!(decoder.finish(), Some(delta("end", true)));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_decoder_reports_overflow_as_malformed() {
        let mut decoder = ChunkDecoder::with_capacity(8);
        let chunks = decoder.push(b"{\"message\":{\"content\":\"too long\"}}\n");
        assert_eq!(chunks.len(), 1);
        assert!(matches!(&chunks[0], DecodedChunk::Malformed(msg) if msg.contains("exceeds")));
    }
}
