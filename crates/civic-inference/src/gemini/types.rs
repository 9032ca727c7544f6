//! Wire types for `models/{model}:generateContent`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

impl GenerateContentRequest {
    /// Single-turn request carrying one text part.
    pub fn from_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate, if there is a candidate.
    pub fn first_text(&self) -> Option<&str> {
        let candidate = self.candidates.first()?;
        Some(
            candidate
                .content
                .as_ref()
                .and_then(|c| c.parts.first())
                .map(|p| p.text.as_str())
                .unwrap_or_default(),
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiErrorResponse {
    pub error: GeminiError,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiError {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let json = serde_json::to_value(GenerateContentRequest::from_prompt("hi")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"contents": [{"parts": [{"text": "hi"}]}]})
        );
    }

    #[test]
    fn test_first_text() {
        let resp: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "Lighting"}], "role": "model"}}]
        }))
        .unwrap();
        assert_eq!(resp.first_text(), Some("Lighting"));
    }

    #[test]
    fn test_candidate_without_parts_is_empty_text() {
        let resp: GenerateContentResponse =
            serde_json::from_value(serde_json::json!({"candidates": [{"finishReason": "SAFETY"}]}))
                .unwrap();
        assert_eq!(resp.first_text(), Some(""));

        let none: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(none.first_text(), None);
    }
}
