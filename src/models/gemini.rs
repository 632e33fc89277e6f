//! Typed request/response records for the Gemini `streamGenerateContent`
//! endpoint, plus the transport-independent fragment type the stream parser
//! consumes.

use serde::{Deserialize, Serialize};

/// One inbound piece of model output
///
/// `thought` marks intermediate reasoning the model emits before its answer;
/// both kinds are shown live but only non-thought text feeds the final
/// structured extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamFragment {
    pub text: String,
    pub thought: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<RequestContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// Single-turn user prompt with thought summaries enabled
    pub fn with_thoughts(prompt: &str) -> Self {
        Self {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: Some(GenerationConfig {
                thinking_config: Some(ThinkingConfig {
                    include_thoughts: true,
                }),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestContent {
    pub parts: Vec<RequestPart>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestPart {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    pub include_thoughts: bool,
}

/// One SSE `data:` payload from the streaming endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentChunk {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePart {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub thought: Option<bool>,
}

impl GenerateContentChunk {
    /// Flattens every text-bearing part into stream fragments, in order
    pub fn into_fragments(self) -> Vec<StreamFragment> {
        self.candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|content| content.parts)
            .filter_map(|part| {
                part.text.map(|text| StreamFragment {
                    text,
                    thought: part.thought.unwrap_or(false),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_into_fragments_marks_thoughts() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "Weighing options...", "thought": true},
                        {"text": "Here is my pick: "}
                    ]
                }
            }]
        }"#;
        let chunk: GenerateContentChunk = serde_json::from_str(json).unwrap();
        let fragments = chunk.into_fragments();
        assert_eq!(fragments.len(), 2);
        assert!(fragments[0].thought);
        assert_eq!(fragments[0].text, "Weighing options...");
        assert!(!fragments[1].thought);
    }

    #[test]
    fn test_chunk_without_text_parts_yields_nothing() {
        let json = r#"{"candidates": [{"content": {"parts": [{}]}}]}"#;
        let chunk: GenerateContentChunk = serde_json::from_str(json).unwrap();
        assert!(chunk.into_fragments().is_empty());
    }

    #[test]
    fn test_request_with_thoughts_serialization() {
        let request = GenerateContentRequest::with_thoughts("recommend me something");
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""includeThoughts":true"#));
        assert!(json.contains("recommend me something"));
    }
}
