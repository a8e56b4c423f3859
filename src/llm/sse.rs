//! Minimal server-sent-events decoder for provider streams
//!
//! Byte chunks from the HTTP body are buffered until a full line is
//! available; `data:` payloads are handed out, everything else is skipped.

use crate::error::AgentError;
use crate::Result;
use futures::stream::{self, Stream, StreamExt};

/// Incremental `data:` line decoder
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return the payloads of every completed `data:` line
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(payload) = data_payload(&line) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Flush a trailing line that was not newline-terminated
    pub fn finish(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.buffer);
        data_payload(&line)
    }
}

fn data_payload(line: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(line);
    let text = text.trim_end_matches(['\r', '\n']);
    let payload = text.strip_prefix("data:")?;
    Some(payload.strip_prefix(' ').unwrap_or(payload).to_string())
}

/// Turn a provider byte stream into a stream of `data:` payloads
pub fn data_events<S, B, E>(body: S) -> impl Stream<Item = Result<String>> + Send
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<AgentError> + Send + 'static,
{
    // A `None` marks end of body so the decoder can flush its remainder
    let chunks = body.map(Some).chain(stream::once(async { None }));

    chunks
        .scan(SseDecoder::new(), |decoder, item| {
            let out: Vec<Result<String>> = match item {
                Some(Ok(bytes)) => decoder.push(bytes.as_ref()).into_iter().map(Ok).collect(),
                Some(Err(e)) => vec![Err(e.into())],
                None => decoder.finish().into_iter().map(Ok).collect(),
            };
            futures::future::ready(Some(stream::iter(out)))
        })
        .flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"a\":").is_empty());
        assert_eq!(decoder.push(b"1}\n\ndata: [DONE]\n"), vec!["{\"a\":1}", "[DONE]"]);
    }

    #[test]
    fn test_non_data_lines_skipped() {
        let mut decoder = SseDecoder::new();
        let out = decoder.push(b": keep-alive\r\nevent: message\r\ndata:x\r\n\r\n");
        assert_eq!(out, vec!["x"]);
    }

    #[test]
    fn test_multibyte_character_split() {
        let bytes = "data: ₹100\n".as_bytes();
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(&bytes[..7]).is_empty());
        assert_eq!(decoder.push(&bytes[7..]), vec!["₹100"]);
    }

    #[test]
    fn test_finish_flushes_unterminated_line() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: tail").is_empty());
        assert_eq!(decoder.finish(), Some("tail".to_string()));
        assert_eq!(decoder.finish(), None);
    }

    #[tokio::test]
    async fn test_data_events_stream() {
        let chunks: Vec<std::result::Result<Vec<u8>, AgentError>> = vec![
            Ok(b"data: one\ndata: t".to_vec()),
            Ok(b"wo\n".to_vec()),
            Ok(b"data: three".to_vec()),
        ];

        let events: Vec<String> = data_events(stream::iter(chunks))
            .map(|e| e.unwrap())
            .collect()
            .await;

        assert_eq!(events, vec!["one", "two", "three"]);
    }
}
