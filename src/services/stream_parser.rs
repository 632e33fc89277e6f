/// Incremental parser for the model's mixed reasoning/answer stream
///
/// Fragments accumulate into two buffers: intermediate reasoning and the
/// answer proper. Every pushed fragment produces a display string (the
/// reasoning so far plus the answer so far), with the raw structured block
/// masked behind a placeholder once its opening fence shows up. When the
/// stream ends, `finish` extracts the trailing structured payload. None of
/// this can fail: a payload that will not parse degrades to a fixed
/// fallback message.
use crate::models::VideoSuggestion;
use serde::Deserialize;

/// Marker the model is instructed to open its structured block with
pub const RESULT_FENCE: &str = "```";

/// Shown in place of the raw structured payload while it streams in
const RECEIVING_PLACEHOLDER: &str = "\n\nPutting the list together...";

/// Final message when the structured payload cannot be parsed
pub const FALLBACK_MESSAGE: &str =
    "I found some picks but couldn't format them properly. Please try asking again.";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StructuredAnswer {
    #[serde(default)]
    answer: String,
    #[serde(default)]
    suggested_items: Vec<VideoSuggestion>,
}

#[derive(Debug, Default)]
pub struct StreamingResponseParser {
    thinking: String,
    answer: String,
}

impl StreamingResponseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorbs one fragment and returns the text to display
    pub fn push(&mut self, text: &str, thought: bool) -> String {
        if thought {
            self.thinking.push_str(text);
        } else {
            self.answer.push_str(text);
        }
        self.display_text()
    }

    fn display_text(&self) -> String {
        let answer_part = match self.answer.find(RESULT_FENCE) {
            Some(idx) => format!("{}{}", &self.answer[..idx], RECEIVING_PLACEHOLDER),
            None => self.answer.clone(),
        };
        format!("{}{}", self.thinking, answer_part)
    }

    /// Consumes the parser at stream end and extracts the structured payload
    ///
    /// Returns the final answer text and the referenced items. Absence of
    /// any structured block means the whole answer text is the message;
    /// a present-but-unparseable block yields the fallback message.
    pub fn finish(self) -> (String, Vec<VideoSuggestion>) {
        let Some(payload) = extract_payload(&self.answer) else {
            return (self.answer, Vec::new());
        };

        match serde_json::from_str::<StructuredAnswer>(payload) {
            Ok(parsed) => (parsed.answer, parsed.suggested_items),
            Err(e) => {
                tracing::warn!(error = %e, "Structured payload failed to parse");
                (FALLBACK_MESSAGE.to_string(), Vec::new())
            }
        }
    }
}

/// Locates the structured payload inside the final answer text
///
/// Prefers a fenced block (between the first opening fence and the last
/// closing fence); falls back to the outermost brace pair. `None` means
/// the answer carries no structured block at all.
fn extract_payload(text: &str) -> Option<&str> {
    if let Some(start) = text.find(RESULT_FENCE) {
        let after = &text[start + RESULT_FENCE.len()..];
        let after = after.strip_prefix("json").unwrap_or(after);
        return match after.rfind(RESULT_FENCE) {
            Some(end) => Some(&after[..end]),
            // Unterminated fence: take everything after the opening.
            None => Some(after),
        };
    }

    let open = text.find('{')?;
    let close = text.rfind('}')?;
    if close <= open {
        return None;
    }
    Some(&text[open..=close])
}
