//! Incremental server-sent-events framing for streaming transcription.
//!
//! The HTTP body arrives as arbitrary byte chunks that do not respect line or
//! even UTF-8 boundaries. [`SseBuffer`] reassembles complete lines;
//! [`parse_line`] classifies each line into a text delta, the end-of-stream
//! marker, or noise to skip. Malformed payloads are skipped rather than
//! treated as fatal so one bad event cannot kill an otherwise healthy stream.

use serde::Deserialize;

// ---------------------------------------------------------------------------
// SseBuffer
// ---------------------------------------------------------------------------

/// Reassembles complete lines out of arbitrary byte chunks.
#[derive(Debug, Default)]
pub struct SseBuffer {
    pending: Vec<u8>,
}

impl SseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line completed by it, with the
    /// trailing `\r` of CRLF endings removed. Bytes after the last newline
    /// stay buffered until a later chunk completes them.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            line.pop(); // the newline itself
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }
}

// ---------------------------------------------------------------------------
// Event parsing
// ---------------------------------------------------------------------------

/// Classification of one SSE line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// Incremental transcript text.
    Delta(String),
    /// The `[DONE]` end-of-stream marker.
    Done,
    /// Comment, keep-alive, empty delta, or malformed payload.
    Skip,
}

/// Event payload shape: incremental events carry `delta`, the terminal event
/// carries the full `text` (already covered by the deltas, so not re-emitted).
#[derive(Debug, Deserialize)]
struct StreamChunk {
    delta: Option<String>,
    #[serde(rename = "type")]
    #[allow(dead_code)]
    kind: Option<String>,
    #[allow(dead_code)]
    text: Option<String>,
}

/// Classify one reassembled SSE line.
pub fn parse_line(line: &str) -> SseEvent {
    let Some(payload) = line.strip_prefix("data: ") else {
        return SseEvent::Skip;
    };

    if payload == "[DONE]" {
        return SseEvent::Done;
    }

    match serde_json::from_str::<StreamChunk>(payload) {
        Ok(chunk) => match chunk.delta {
            Some(delta) if !delta.is_empty() => SseEvent::Delta(delta),
            _ => SseEvent::Skip,
        },
        Err(err) => {
            log::debug!("skipping malformed SSE payload: {err}");
            SseEvent::Skip
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_holds_partial_lines_across_pushes() {
        let mut buf = SseBuffer::new();
        assert!(buf.push(b"data: {\"del").is_empty());
        let lines = buf.push(b"ta\":\"hi\"}\n");
        assert_eq!(lines, vec!["data: {\"delta\":\"hi\"}"]);
    }

    #[test]
    fn buffer_splits_multiple_lines_in_one_chunk() {
        let mut buf = SseBuffer::new();
        let lines = buf.push(b"first\nsecond\nthird");
        assert_eq!(lines, vec!["first", "second"]);
        assert_eq!(buf.push(b"\n"), vec!["third"]);
    }

    #[test]
    fn buffer_strips_crlf_endings() {
        let mut buf = SseBuffer::new();
        assert_eq!(buf.push(b"data: [DONE]\r\n"), vec!["data: [DONE]"]);
    }

    #[test]
    fn buffer_tolerates_utf8_split_across_chunks() {
        let mut buf = SseBuffer::new();
        let line = "data: {\"delta\":\"你好\"}\n".as_bytes();
        let (head, tail) = line.split_at(line.len() - 6); // mid-codepoint
        assert!(buf.push(head).is_empty());
        let lines = buf.push(tail);
        assert_eq!(parse_line(&lines[0]), SseEvent::Delta("你好".into()));
    }

    #[test]
    fn data_lines_yield_deltas() {
        assert_eq!(
            parse_line(r#"data: {"delta":"大","type":"transcript.text.delta"}"#),
            SseEvent::Delta("大".into())
        );
    }

    #[test]
    fn done_marker_ends_the_stream() {
        assert_eq!(parse_line("data: [DONE]"), SseEvent::Done);
    }

    #[test]
    fn non_data_lines_are_skipped() {
        assert_eq!(parse_line(""), SseEvent::Skip);
        assert_eq!(parse_line(": keep-alive"), SseEvent::Skip);
        assert_eq!(parse_line("event: update"), SseEvent::Skip);
    }

    #[test]
    fn malformed_json_is_skipped_not_fatal() {
        assert_eq!(parse_line("data: {not json"), SseEvent::Skip);
    }

    #[test]
    fn empty_or_missing_delta_is_skipped() {
        assert_eq!(parse_line(r#"data: {"delta":""}"#), SseEvent::Skip);
        assert_eq!(
            parse_line(r#"data: {"text":"大黄你好","type":"transcript.text.done"}"#),
            SseEvent::Skip
        );
    }
}
