use serde::{Deserialize, Serialize};

pub const PLACEHOLDER_CAPTION: &str = "A new variation of the uploaded image.";
pub const CAPTION_INSTRUCTION: &str =
    "Describe this image in one detailed, creative sentence for an image generator.";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionSource {
    Model,
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptionResult {
    pub text: String,
    pub source: CaptionSource,
}

impl CaptionResult {
    pub fn placeholder() -> Self {
        Self {
            text: PLACEHOLDER_CAPTION.to_string(),
            source: CaptionSource::Placeholder,
        }
    }

    pub fn from_model(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: CaptionSource::Model,
        }
    }
}

// generateContent wire types

#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Clone, Serialize)]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// `candidates[0].content.parts[0].text`, if non-empty.
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serializes_text_then_inline_data() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: CAPTION_INSTRUCTION.into(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/png".into(),
                            data: "aGVsbG8=".into(),
                        },
                    },
                ],
            }],
        };

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], CAPTION_INSTRUCTION);
        assert_eq!(
            body["contents"][0]["parts"][1],
            json!({"inline_data": {"mime_type": "image/png", "data": "aGVsbG8="}})
        );
    }

    #[test]
    fn test_first_text_walks_nested_path() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "A fox in the snow."}]}}]
        }))
        .unwrap();
        assert_eq!(response.first_text(), Some("A fox in the snow."));

        let blocked: GenerateContentResponse =
            serde_json::from_value(json!({"candidates": [{"finishReason": "SAFETY"}]})).unwrap();
        assert_eq!(blocked.first_text(), None);
    }
}
