//! Server-Sent Events (SSE) decoder
//!
//! Buffers incoming bytes and extracts complete `data:` payloads. Handles
//! frames split across chunks, several frames in one chunk, and a final
//! frame without a trailing newline.

/// Incremental `data:` line extractor
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: String,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push incoming bytes and extract complete `data:` payloads
    ///
    /// Returns payload strings with the `data:` prefix stripped, in wire
    /// order. An incomplete trailing line stays buffered for the next
    /// `feed()` or `flush()`.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        // Lossy conversion keeps the stream alive on stray bytes
        self.buffer.push_str(&String::from_utf8_lossy(bytes));

        let mut payloads = Vec::new();
        while let Some(newline_pos) = self.buffer.find('\n') {
            let rest = self.buffer.split_off(newline_pos + 1);
            let line = std::mem::replace(&mut self.buffer, rest);
            if let Some(payload) = Self::data_payload(&line) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Drain whatever is still buffered when the stream ends
    ///
    /// Extracts a final frame that arrived without its trailing newline.
    pub fn flush(&mut self) -> Vec<String> {
        let payloads = self.buffer.lines().filter_map(Self::data_payload).collect();
        self.buffer.clear();
        payloads
    }

    fn data_payload(line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            // Blank lines are frame separators
            return None;
        }
        line.strip_prefix("data:").map(|p| p.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_complete_frame() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.feed(b"data: {\"delta\":\"He\"}\n\n");
        assert_eq!(payloads, vec!["{\"delta\":\"He\"}"]);
    }

    #[test]
    fn test_multiple_frames_in_one_chunk() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.feed(b"data: {\"delta\":\"He\"}\n\ndata: {\"delta\":\"llo\"}\n\n");
        assert_eq!(payloads, vec!["{\"delta\":\"He\"}", "{\"delta\":\"llo\"}"]);
    }

    #[test]
    fn test_frame_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: {\"delta\":\"He").is_empty());
        assert_eq!(decoder.feed(b"llo\"}\n\n"), vec!["{\"delta\":\"Hello\"}"]);
    }

    #[test]
    fn test_sentinel_is_just_a_payload() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.feed(b"data: [DONE]\n\n");
        assert_eq!(payloads, vec!["[DONE]"]);
    }

    #[test]
    fn test_final_frame_without_trailing_newline() {
        let mut decoder = SseDecoder::new();
        assert_eq!(decoder.feed(b"data: {\"a\":1}\n\n"), vec!["{\"a\":1}"]);
        assert!(decoder.feed(b"data: {\"b\":2}").is_empty());
        assert_eq!(decoder.flush(), vec!["{\"b\":2}"]);
        // Flushing again yields nothing
        assert!(decoder.flush().is_empty());
    }

    #[test]
    fn test_comment_and_event_lines_ignored() {
        let mut decoder = SseDecoder::new();
        let payloads =
            decoder.feed(b": keepalive\ndata: {\"x\":1}\nevent: message\ndata: {\"y\":2}\n\n");
        assert_eq!(payloads, vec!["{\"x\":1}", "{\"y\":2}"]);
    }

    #[test]
    fn test_blank_lines_ignored() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.feed(b"\n\ndata: {\"x\":1}\n\n\n");
        assert_eq!(payloads, vec!["{\"x\":1}"]);
    }

    #[test]
    fn test_invalid_utf8_does_not_kill_the_stream() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.feed(b"data: {\"delta\":\"\xFF\"}\n");
        assert_eq!(payloads.len(), 1);
        assert!(payloads[0].contains("delta"));
    }
}
