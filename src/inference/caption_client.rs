use std::sync::Arc;

use crate::{
    config::GeminiConfig,
    error::{GenFlowError, Result},
    inference::transport::{HttpRequest, HttpTransport, RequestBody},
    logger,
    models::{
        ApiErrorBody, CaptionResult, Content, GenerateContentRequest, GenerateContentResponse,
        InlineData, Part, UploadedImage, CAPTION_INSTRUCTION,
    },
};

/// Vision captioning through a generateContent-style endpoint. The key
/// travels as a query parameter rather than a bearer header.
#[derive(Clone)]
pub struct CaptionClient {
    transport: Arc<dyn HttpTransport>,
    api_key: String,
    base_url: String,
    model: String,
}

impl CaptionClient {
    pub fn new(transport: Arc<dyn HttpTransport>, config: &GeminiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| GenFlowError::ConfigError("Gemini API key is required".into()))?;

        Ok(Self {
            transport,
            api_key,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            model: config.model().to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }

    pub async fn describe(&self, image: &UploadedImage) -> Result<CaptionResult> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: CAPTION_INSTRUCTION.to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.media_type.clone(),
                            data: image.to_base64(),
                        },
                    },
                ],
            }],
        };

        let body = serde_json::to_value(&request)?;
        let http_request = HttpRequest::post(self.endpoint(), RequestBody::Json(body));

        log::info!("Captioning {} with model: {}", image.file_name_or_default(), self.model);
        let _timer = logger::timer("caption");

        let response = self.transport.send(http_request).await?;

        if !response.is_success() {
            let raw = response.text();
            let message = serde_json::from_str::<ApiErrorBody>(&raw)
                .map(|e| e.error.message)
                .unwrap_or(raw);
            log::error!("Captioning failed ({}): {}", response.status, message);
            return Err(GenFlowError::api(
                format!("Gemini {}", self.model),
                response.status,
                message,
            ));
        }

        let parsed: GenerateContentResponse = serde_json::from_slice(&response.body)
            .map_err(|e| GenFlowError::ResponseError(e.to_string()))?;

        let text = parsed
            .first_text()
            .ok_or_else(|| GenFlowError::NoData("No caption returned from the vision model.".into()))?;

        Ok(CaptionResult::from_model(text.trim()))
    }
}
