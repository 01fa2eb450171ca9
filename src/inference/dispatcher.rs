use serde_json::Value;
use std::sync::Arc;

use crate::{
    config::HuggingFaceConfig,
    error::{GenFlowError, Result},
    inference::transport::{HttpRequest, HttpResponse, HttpTransport, RequestBody},
    logger,
};

const SERVICE: &str = "Hugging Face";

/// What goes out: structured data is encoded as JSON, raw bytes are sent as-is.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Binary(Vec<u8>),
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Json(value)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Binary(bytes)
    }
}

/// A successful response, decoded according to its declared content type.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceOutput {
    StructuredData(Value),
    BinaryBlob { media_type: String, bytes: Vec<u8> },
    PlainText(String),
}

impl InferenceOutput {
    pub fn from_response(response: HttpResponse) -> Result<Self> {
        let content_type = response.content_type.unwrap_or_default();

        if content_type.contains("application/json") {
            let value = serde_json::from_slice(&response.body)
                .map_err(|e| GenFlowError::ResponseError(format!("Invalid JSON body: {}", e)))?;
            Ok(InferenceOutput::StructuredData(value))
        } else if content_type.contains("image") {
            let media_type = content_type
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_string();
            Ok(InferenceOutput::BinaryBlob {
                media_type,
                bytes: response.body,
            })
        } else {
            Ok(InferenceOutput::PlainText(
                String::from_utf8_lossy(&response.body).into_owned(),
            ))
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            InferenceOutput::StructuredData(_) => "structured data",
            InferenceOutput::BinaryBlob { .. } => "binary blob",
            InferenceOutput::PlainText(_) => "plain text",
        }
    }

    pub fn into_structured(self) -> Result<Value> {
        match self {
            InferenceOutput::StructuredData(value) => Ok(value),
            other => Err(GenFlowError::ResponseError(format!(
                "Expected structured data, got {}",
                other.kind()
            ))),
        }
    }
}

/// Sends one authenticated POST per call to `{base_url}/models/{model}`.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn HttpTransport>,
    api_token: String,
    base_url: String,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn HttpTransport>, config: &HuggingFaceConfig) -> Result<Self> {
        let api_token = config.api_token.clone().ok_or_else(|| {
            GenFlowError::ConfigError("Hugging Face API token is required".into())
        })?;

        Ok(Self {
            transport,
            api_token,
            base_url: config.base_url().trim_end_matches('/').to_string(),
        })
    }

    pub fn model_url(&self, model: &str) -> String {
        format!("{}/models/{}", self.base_url, model)
    }

    pub async fn query(&self, model: &str, payload: impl Into<Payload>) -> Result<InferenceOutput> {
        let body = match payload.into() {
            Payload::Json(value) => RequestBody::Json(value),
            Payload::Binary(bytes) => RequestBody::Binary(bytes),
        };
        let request = HttpRequest::post(self.model_url(model), body).with_bearer(&self.api_token);

        log::info!("Querying model: {}", model);
        let _timer = logger::timer(&format!("query {}", model));

        let response = self.transport.send(request).await?;

        if !response.is_success() {
            let body = response.text();
            log::error!("API Error Response ({}): {}", response.status, body);
            return Err(GenFlowError::api(SERVICE, response.status, body));
        }

        let output = InferenceOutput::from_response(response)?;
        log::debug!("Model {} answered with {}", model, output.kind());
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::transport::testing::{raw_response, FakeTransport};
    use serde_json::json;

    fn dispatcher(fake: &Arc<FakeTransport>) -> Dispatcher {
        let config = HuggingFaceConfig::new()
            .with_credentials("hf_secret")
            .with_base_url("https://hf.test/");
        Dispatcher::new(fake.clone(), &config).unwrap()
    }

    #[tokio::test]
    async fn test_json_payload_is_sent_with_bearer() {
        let fake = Arc::new(FakeTransport::new().respond_json(200, json!([{"label": "neutral"}])));
        let output = dispatcher(&fake)
            .query("org/model", json!({"inputs": "hi"}))
            .await
            .unwrap();

        assert_eq!(
            output,
            InferenceOutput::StructuredData(json!([{"label": "neutral"}]))
        );
        let sent = fake.requests();
        assert_eq!(sent[0].url, "https://hf.test/models/org/model");
        assert_eq!(sent[0].bearer_token.as_deref(), Some("hf_secret"));
        assert!(matches!(sent[0].body, RequestBody::Json(_)));
    }

    #[tokio::test]
    async fn test_binary_payload_has_no_content_type_override() {
        let fake = Arc::new(FakeTransport::new().respond(raw_response(
            200,
            Some("application/json"),
            b"[]",
        )));
        dispatcher(&fake)
            .query("org/captioner", vec![0x89u8, 0x50, 0x4E, 0x47])
            .await
            .unwrap();

        let sent = fake.requests();
        assert!(matches!(&sent[0].body, RequestBody::Binary(b) if b.len() == 4));
        assert_eq!(sent[0].header("content-type"), None);
    }

    #[tokio::test]
    async fn test_image_content_type_yields_blob() {
        let fake = Arc::new(FakeTransport::new().respond(raw_response(
            200,
            Some("image/jpeg"),
            &[0xFF, 0xD8],
        )));
        let output = dispatcher(&fake)
            .query("org/painter", json!({"inputs": "a boat"}))
            .await
            .unwrap();

        assert_eq!(
            output,
            InferenceOutput::BinaryBlob {
                media_type: "image/jpeg".into(),
                bytes: vec![0xFF, 0xD8],
            }
        );
    }

    #[tokio::test]
    async fn test_other_content_types_are_plain_text() {
        let fake = Arc::new(
            FakeTransport::new()
                .respond(raw_response(200, Some("text/plain"), b"hello"))
                .respond(raw_response(200, None, b"bare")),
        );
        let dispatcher = dispatcher(&fake);

        let first = dispatcher.query("m", json!({})).await.unwrap();
        let second = dispatcher.query("m", json!({})).await.unwrap();
        assert_eq!(first, InferenceOutput::PlainText("hello".into()));
        assert_eq!(second, InferenceOutput::PlainText("bare".into()));
    }

    #[tokio::test]
    async fn test_non_success_status_in_error_message() {
        for status in [400u16, 401, 429, 500, 503] {
            let fake = Arc::new(FakeTransport::new().respond(raw_response(
                status,
                Some("application/json"),
                br#"{"error":"nope"}"#,
            )));
            let err = dispatcher(&fake)
                .query("m", json!({"inputs": "x"}))
                .await
                .unwrap_err();

            assert!(err.to_string().contains(&status.to_string()));
            assert!(err.to_string().contains(r#"{"error":"nope"}"#));
        }
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_response_error() {
        let fake = Arc::new(FakeTransport::new().respond(raw_response(
            200,
            Some("application/json"),
            b"{not json",
        )));
        let err = dispatcher(&fake).query("m", json!({})).await.unwrap_err();
        assert!(matches!(err, GenFlowError::ResponseError(_)));
    }

    #[test]
    fn test_missing_token_fails_at_construction() {
        let fake: Arc<dyn HttpTransport> = Arc::new(FakeTransport::new());
        let result = Dispatcher::new(fake, &HuggingFaceConfig::new());
        assert!(matches!(result, Err(GenFlowError::ConfigError(_))));
    }
}
