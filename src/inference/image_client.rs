use std::sync::Arc;

use crate::{
    config::{StabilityConfig, DEFAULT_IMAGE_STRENGTH},
    error::{GenFlowError, Result},
    inference::transport::{FormPart, HttpRequest, HttpResponse, HttpTransport, RequestBody},
    logger,
    models::{
        ArtifactResponse, GeneratedImage, ImageToImageRequest, TextPrompt, TextToImageRequest,
        UploadedImage,
    },
};

const SERVICE: &str = "Stability AI";

#[derive(Clone)]
pub struct ImageClient {
    transport: Arc<dyn HttpTransport>,
    api_key: String,
    base_url: String,
    engine_id: String,
    cfg_scale: f32,
    width: u32,
    height: u32,
    steps: u32,
    samples: u32,
    image_strength: f32,
}

impl ImageClient {
    pub fn new(transport: Arc<dyn HttpTransport>, config: &StabilityConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| GenFlowError::ConfigError("Stability API key is required".into()))?;

        let image_strength = config.image_strength.unwrap_or(DEFAULT_IMAGE_STRENGTH);
        validate_strength(image_strength)?;

        Ok(Self {
            transport,
            api_key,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            engine_id: config.engine_id().to_string(),
            cfg_scale: config.cfg_scale.unwrap_or(7.0),
            // XL engines only accept 1024x1024
            width: config.width.unwrap_or(1024),
            height: config.height.unwrap_or(1024),
            steps: config.steps.unwrap_or(30),
            samples: config.samples.unwrap_or(1),
            image_strength,
        })
    }

    pub fn default_strength(&self) -> f32 {
        self.image_strength
    }

    fn endpoint(&self, task: &str) -> String {
        format!("{}/v1/generation/{}/{}", self.base_url, self.engine_id, task)
    }

    pub fn text_to_image_request(&self, prompt: &str) -> TextToImageRequest {
        TextToImageRequest {
            text_prompts: vec![TextPrompt {
                text: prompt.to_string(),
                weight: None,
            }],
            cfg_scale: self.cfg_scale,
            height: self.height,
            width: self.width,
            steps: self.steps,
            samples: self.samples,
        }
    }

    pub fn image_to_image_request(
        &self,
        image: UploadedImage,
        prompt: &str,
        strength: Option<f32>,
    ) -> ImageToImageRequest {
        ImageToImageRequest {
            init_image: image,
            prompt: prompt.to_string(),
            image_strength: strength.unwrap_or(self.image_strength),
            cfg_scale: self.cfg_scale,
            steps: self.steps,
            samples: self.samples,
        }
    }

    pub async fn text_to_image(&self, request: TextToImageRequest) -> Result<GeneratedImage> {
        let body = serde_json::to_value(&request)?;
        let http_request = HttpRequest::post(self.endpoint("text-to-image"), RequestBody::Json(body))
            .with_bearer(&self.api_key)
            .with_header("Accept", "application/json");

        log::info!("Generating image with engine: {}", self.engine_id);
        let _timer = logger::timer("text-to-image");

        let response = self.transport.send(http_request).await?;
        Self::extract_image(response)
    }

    pub async fn image_to_image(&self, request: ImageToImageRequest) -> Result<GeneratedImage> {
        validate_strength(request.image_strength)?;

        let init_image = request.init_image;
        let file_name = init_image.file_name_or_default().to_string();
        let parts = vec![
            FormPart::file(
                "init_image",
                init_image.bytes,
                file_name,
                init_image.media_type,
            ),
            FormPart::text("init_image_mode", "IMAGE_STRENGTH"),
            FormPart::text("image_strength", request.image_strength),
            FormPart::text("text_prompts[0][text]", &request.prompt),
            FormPart::text("text_prompts[0][weight]", 1),
            FormPart::text("cfg_scale", request.cfg_scale),
            FormPart::text("samples", request.samples),
            FormPart::text("steps", request.steps),
        ];

        let http_request =
            HttpRequest::post(self.endpoint("image-to-image"), RequestBody::Multipart(parts))
                .with_bearer(&self.api_key)
                .with_header("Accept", "application/json");

        log::info!(
            "Generating variation with engine: {} (strength {:.2})",
            self.engine_id,
            request.image_strength
        );
        let _timer = logger::timer("image-to-image");

        let response = self.transport.send(http_request).await?;
        Self::extract_image(response)
    }

    fn extract_image(response: HttpResponse) -> Result<GeneratedImage> {
        if !response.is_success() {
            let body = response.text();
            log::error!("Stability error response ({}): {}", response.status, body);
            return Err(GenFlowError::api(SERVICE, response.status, body));
        }

        let artifacts: ArtifactResponse = serde_json::from_slice(&response.body)
            .map_err(|e| GenFlowError::ResponseError(e.to_string()))?;

        artifacts.into_first_image()
    }
}

fn validate_strength(strength: f32) -> Result<()> {
    if (0.0..=1.0).contains(&strength) {
        Ok(())
    } else {
        Err(GenFlowError::ConfigError(format!(
            "Image strength must be between 0.0 and 1.0, got {}",
            strength
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::transport::{testing::FakeTransport, FormValue};
    use serde_json::json;

    fn client(fake: &Arc<FakeTransport>) -> ImageClient {
        let config = StabilityConfig::new()
            .with_credentials("sk-test")
            .with_base_url("https://stability.test");
        ImageClient::new(fake.clone(), &config).unwrap()
    }

    fn form_text<'a>(parts: &'a [FormPart], name: &str) -> Option<&'a str> {
        parts.iter().find(|p| p.name == name).and_then(|p| match &p.value {
            FormValue::Text(text) => Some(text.as_str()),
            FormValue::File { .. } => None,
        })
    }

    #[tokio::test]
    async fn test_text_to_image_request_and_artifact() {
        let fake = Arc::new(
            FakeTransport::new().respond_json(200, json!({"artifacts": [{"base64": "abc123"}]})),
        );
        let client = client(&fake);

        let image = client
            .text_to_image(client.text_to_image_request("a cat sitting on a windowsill"))
            .await
            .unwrap();
        assert_eq!(image.data_uri(), "data:image/png;base64,abc123");

        let sent = fake.requests();
        assert_eq!(
            sent[0].url,
            "https://stability.test/v1/generation/stable-diffusion-xl-1024-v1-0/text-to-image"
        );
        assert_eq!(sent[0].bearer_token.as_deref(), Some("sk-test"));
        assert_eq!(sent[0].header("Accept"), Some("application/json"));
        match &sent[0].body {
            RequestBody::Json(body) => {
                assert_eq!(body["text_prompts"][0]["text"], "a cat sitting on a windowsill");
                assert_eq!(body["cfg_scale"], 7.0);
                assert_eq!(body["width"], 1024);
                assert_eq!(body["steps"], 30);
            }
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_image_to_image_sends_multipart_fields() {
        let fake = Arc::new(
            FakeTransport::new().respond_json(200, json!({"artifacts": [{"base64": "xyz"}]})),
        );
        let client = client(&fake);
        let upload = UploadedImage::new(vec![1, 2, 3], "image/png").with_file_name("cat.png");

        client
            .image_to_image(client.image_to_image_request(upload, "a caption", Some(0.5)))
            .await
            .unwrap();

        let sent = fake.requests();
        assert!(sent[0].url.ends_with("/image-to-image"));
        let RequestBody::Multipart(parts) = &sent[0].body else {
            panic!("expected multipart body");
        };

        match &parts[0].value {
            FormValue::File {
                bytes,
                file_name,
                media_type,
            } => {
                assert_eq!(parts[0].name, "init_image");
                assert_eq!(bytes, &vec![1, 2, 3]);
                assert_eq!(file_name, "cat.png");
                assert_eq!(media_type, "image/png");
            }
            FormValue::Text(_) => panic!("init_image must be a file part"),
        }
        assert_eq!(form_text(parts, "init_image_mode"), Some("IMAGE_STRENGTH"));
        assert_eq!(form_text(parts, "image_strength"), Some("0.5"));
        assert_eq!(form_text(parts, "text_prompts[0][text]"), Some("a caption"));
        assert_eq!(form_text(parts, "text_prompts[0][weight]"), Some("1"));
        assert_eq!(form_text(parts, "samples"), Some("1"));
        assert_eq!(form_text(parts, "steps"), Some("30"));
    }

    #[tokio::test]
    async fn test_missing_artifact_is_no_data() {
        let fake = Arc::new(FakeTransport::new().respond_json(200, json!({"artifacts": []})));
        let client = client(&fake);
        let err = client
            .text_to_image(client.text_to_image_request("x"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No image data returned from Stability AI.");
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let fake = Arc::new(
            FakeTransport::new().respond_json(401, json!({"message": "invalid api key"})),
        );
        let client = client(&fake);
        let err = client
            .text_to_image(client.text_to_image_request("x"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert!(err.to_string().contains("invalid api key"));
    }

    #[tokio::test]
    async fn test_out_of_range_strength_is_rejected_before_sending() {
        let fake = Arc::new(FakeTransport::new());
        let client = client(&fake);
        let upload = UploadedImage::new(vec![0], "image/png");

        let err = client
            .image_to_image(client.image_to_image_request(upload, "x", Some(1.5)))
            .await
            .unwrap_err();
        assert!(matches!(err, GenFlowError::ConfigError(_)));
        assert_eq!(fake.request_count(), 0);
    }
}
