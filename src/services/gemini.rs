/// Gemini streaming client
///
/// Opens `streamGenerateContent` over SSE and turns the raw byte stream
/// into typed fragments. The event-line framing is a transport detail:
/// the consumer loop tolerates blank keep-alives, comment lines, and
/// malformed chunks without ever terminating the stream over them.
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::Client as HttpClient;

use crate::{
    error::{AppError, AppResult},
    models::gemini::{GenerateContentChunk, GenerateContentRequest, StreamFragment},
};

const SSE_DATA_PREFIX: &str = "data:";

/// Streaming generative model contract consumed by the recommendation
/// service
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Opens a streaming completion for the prompt
    ///
    /// Fragments are delivered in model order. Errors after a successful
    /// open are transport failures surfaced as stream items; the caller
    /// decides whether to salvage what arrived before them.
    async fn stream_generate(
        &self,
        prompt: &str,
    ) -> AppResult<BoxStream<'static, AppResult<StreamFragment>>>;
}

#[derive(Clone)]
pub struct GeminiClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            model,
        }
    }
}

#[async_trait::async_trait]
impl GenerativeModel for GeminiClient {
    async fn stream_generate(
        &self,
        prompt: &str,
    ) -> AppResult<BoxStream<'static, AppResult<StreamFragment>>> {
        let url = format!(
            "{}/models/{}:streamGenerateContent",
            self.api_url, self.model
        );
        let request = GenerateContentRequest::with_thoughts(prompt);

        tracing::debug!(model = %self.model, "Opening Gemini stream");

        let response = self
            .http_client
            .post(&url)
            .query(&[("alt", "sse"), ("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Gemini API returned status {}: {}",
                status, body
            )));
        }

        let mut bytes = response.bytes_stream();

        let stream = async_stream::stream! {
            let mut decoder = LineDecoder::new();

            while let Some(chunk) = bytes.next().await {
                match chunk {
                    Ok(chunk) => {
                        for line in decoder.push(&chunk) {
                            for fragment in parse_sse_line(&line) {
                                yield Ok(fragment);
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(AppError::HttpClient(e));
                        return;
                    }
                }
            }

            // A final line without a trailing newline still counts.
            if let Some(line) = decoder.finish() {
                for fragment in parse_sse_line(&line) {
                    yield Ok(fragment);
                }
            }
        };

        Ok(stream.boxed())
    }
}

/// Splits a byte stream into complete text lines
///
/// Network chunks arrive cut at arbitrary byte offsets, so decoding happens
/// per line, never per chunk: a multi-byte character straddling two chunks
/// stays buffered as raw bytes until its line terminator shows up.
struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Absorbs one chunk and returns every line it completed
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// Flushes the unterminated remainder at end of stream, if any
    fn finish(self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.buffer);
        let line = line.trim_end();
        if line.is_empty() {
            None
        } else {
            Some(line.to_string())
        }
    }
}

/// Parses one SSE line into fragments
///
/// Anything that is not a well-formed `data:` chunk yields nothing:
/// blank keep-alives and `:` comments silently, unparseable payloads with
/// a warning. Skipping is mandatory; one bad frame must not kill the
/// stream.
fn parse_sse_line(line: &str) -> Vec<StreamFragment> {
    let Some(data) = line.strip_prefix(SSE_DATA_PREFIX) else {
        if !line.is_empty() && !line.starts_with(':') {
            tracing::debug!(line = %line, "Ignoring non-data stream line");
        }
        return Vec::new();
    };

    let data = data.trim_start();
    if data.is_empty() || data == "[DONE]" {
        return Vec::new();
    }

    match serde_json::from_str::<GenerateContentChunk>(data) {
        Ok(chunk) => chunk.into_fragments(),
        Err(e) => {
            tracing::warn!(error = %e, "Skipping malformed stream chunk");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sse_line_well_formed() {
        let line = r#"data: {"candidates":[{"content":{"parts":[{"text":"hello"}]}}]}"#;
        let fragments = parse_sse_line(line);
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].text, "hello");
        assert!(!fragments[0].thought);
    }

    #[test]
    fn test_parse_sse_line_thought_part() {
        let line =
            r#"data: {"candidates":[{"content":{"parts":[{"text":"hmm","thought":true}]}}]}"#;
        let fragments = parse_sse_line(line);
        assert_eq!(fragments.len(), 1);
        assert!(fragments[0].thought);
    }

    #[test]
    fn test_parse_sse_line_malformed_is_skipped() {
        assert!(parse_sse_line("data: {not json at all").is_empty());
    }

    #[test]
    fn test_parse_sse_line_ignores_keepalives_and_comments() {
        assert!(parse_sse_line("").is_empty());
        assert!(parse_sse_line(": keep-alive").is_empty());
        assert!(parse_sse_line("event: ping").is_empty());
        assert!(parse_sse_line("data: [DONE]").is_empty());
        assert!(parse_sse_line("data:").is_empty());
    }

    #[test]
    fn test_parse_sse_line_empty_candidates() {
        assert!(parse_sse_line(r#"data: {"candidates":[]}"#).is_empty());
    }

    #[test]
    fn test_line_decoder_splits_on_newlines() {
        let mut decoder = LineDecoder::new();
        assert_eq!(decoder.push(b"one\ntwo\r\nthr"), vec!["one", "two"]);
        assert_eq!(decoder.push(b"ee\n"), vec!["three"]);
        assert!(decoder.finish().is_none());
    }

    #[test]
    fn test_line_decoder_multibyte_character_split_across_chunks() {
        // "café" with the two-byte 'é' (0xC3 0xA9) cut between chunks.
        let mut decoder = LineDecoder::new();
        assert!(decoder.push(b"data: caf\xC3").is_empty());
        let lines = decoder.push(b"\xA9 time\n");
        assert_eq!(lines, vec!["data: caf\u{e9} time"]);
    }

    #[test]
    fn test_line_decoder_flushes_unterminated_tail() {
        let mut decoder = LineDecoder::new();
        assert!(decoder.push(b"data: tail").is_empty());
        assert_eq!(decoder.finish().as_deref(), Some("data: tail"));
    }
}
