use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{GenFlowError, Result};
use crate::models::UploadedImage;

#[derive(Debug, Clone, Serialize)]
pub struct TextPrompt {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextToImageRequest {
    pub text_prompts: Vec<TextPrompt>,
    pub cfg_scale: f32,
    pub height: u32,
    pub width: u32,
    pub steps: u32,
    pub samples: u32,
}

/// Sent as multipart form data, so it is not `Serialize`.
#[derive(Debug, Clone)]
pub struct ImageToImageRequest {
    pub init_image: UploadedImage,
    pub prompt: String,
    /// 0.0 replaces the input entirely, 1.0 returns it unchanged.
    pub image_strength: f32,
    pub cfg_scale: f32,
    pub steps: u32,
    pub samples: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Artifact {
    pub base64: Option<String>,
    #[serde(rename = "finishReason")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactResponse {
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

impl ArtifactResponse {
    pub fn into_first_image(self) -> Result<GeneratedImage> {
        let artifact = self.artifacts.into_iter().next();
        let finish_reason = artifact.as_ref().and_then(|a| a.finish_reason.clone());

        match artifact.and_then(|a| a.base64).filter(|b64| !b64.is_empty()) {
            Some(b64) => Ok(GeneratedImage::png(b64)),
            None => Err(GenFlowError::NoData(match finish_reason {
                Some(reason) => format!(
                    "No image data returned from Stability AI (finish reason: {}).",
                    reason
                ),
                None => "No image data returned from Stability AI.".to_string(),
            })),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pub base64: String,
    pub media_type: String,
}

impl GeneratedImage {
    pub fn png(base64: impl Into<String>) -> Self {
        Self {
            base64: base64.into(),
            media_type: "image/png".to_string(),
        }
    }

    pub fn from_bytes(bytes: &[u8], media_type: impl Into<String>) -> Self {
        Self {
            base64: general_purpose::STANDARD.encode(bytes),
            media_type: media_type.into(),
        }
    }

    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.base64)
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        general_purpose::STANDARD
            .decode(&self.base64)
            .map_err(|e| GenFlowError::ResponseError(format!("Invalid base64 image: {}", e)))
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.decode()?;
        tokio::fs::write(path.as_ref(), bytes).await?;
        log::info!("💾 Image saved to: {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_data_uri_uses_png_prefix() {
        let response: ArtifactResponse =
            serde_json::from_value(json!({"artifacts": [{"base64": "abc123"}]})).unwrap();
        let image = response.into_first_image().unwrap();
        assert_eq!(image.data_uri(), "data:image/png;base64,abc123");
    }

    #[test]
    fn test_missing_artifacts_yield_no_image() {
        let empty: ArtifactResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(
            empty.into_first_image().unwrap_err().to_string(),
            "No image data returned from Stability AI."
        );

        let blank: ArtifactResponse =
            serde_json::from_value(json!({"artifacts": [{"finishReason": "CONTENT_FILTERED"}]}))
                .unwrap();
        assert_eq!(
            blank.into_first_image().unwrap_err().to_string(),
            "No image data returned from Stability AI (finish reason: CONTENT_FILTERED)."
        );
    }

    #[test]
    fn test_text_to_image_body_shape() {
        let request = TextToImageRequest {
            text_prompts: vec![TextPrompt {
                text: "a lighthouse".into(),
                weight: None,
            }],
            cfg_scale: 7.0,
            height: 1024,
            width: 1024,
            steps: 30,
            samples: 1,
        };

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["text_prompts"], json!([{"text": "a lighthouse"}]));
        assert_eq!(body["height"], 1024);
        assert_eq!(body["samples"], 1);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let image = GeneratedImage::png("not base64!!");
        assert!(image.decode().is_err());
        assert_eq!(GeneratedImage::from_bytes(b"png", "image/png").decode().unwrap(), b"png");
    }
}
