use std::sync::Mutex;

use crate::{
    error::Result,
    inference::{ImageClient, InferenceClient},
    models::{CaptionResult, GeneratedImage, UploadedImage},
    workflow::state::{lock, ActionOutcome, IgnoreReason, SingleFlight, WorkflowSnapshot},
};

#[derive(Debug, Default)]
struct ImageState {
    upload: Option<UploadedImage>,
    caption: Option<CaptionResult>,
    variation: Option<GeneratedImage>,
    loading: bool,
    error: Option<String>,
}

/// Uploaded image → placeholder caption → image-to-image variation.
///
/// Analysis is local: the caption is a fixed sentence and no request is
/// made. The variation is blended from the uploaded bytes, so the output
/// stays visually tied to the input.
pub struct ImageWorkflow {
    images: ImageClient,
    strength: Option<f32>,
    flight: SingleFlight,
    state: Mutex<ImageState>,
}

impl ImageWorkflow {
    pub fn new(images: ImageClient) -> Self {
        Self {
            images,
            strength: None,
            flight: SingleFlight::default(),
            state: Mutex::new(ImageState::default()),
        }
    }

    pub fn from_client(client: &InferenceClient) -> Result<Self> {
        Ok(Self::new(client.image()?.clone()))
    }

    /// Blend strength for this controller, overriding the client default.
    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = Some(strength);
        self
    }

    pub fn strength(&self) -> f32 {
        self.strength.unwrap_or_else(|| self.images.default_strength())
    }

    pub fn select_image(&self, upload: UploadedImage) -> ActionOutcome {
        let Some(_flight) = self.flight.try_begin() else {
            return ActionOutcome::Ignored(IgnoreReason::Busy);
        };

        let mut state = lock(&self.state);
        *state = ImageState {
            upload: Some(upload),
            ..ImageState::default()
        };
        ActionOutcome::Completed
    }

    pub fn caption(&self) -> Option<CaptionResult> {
        lock(&self.state).caption.clone()
    }

    pub fn variation(&self) -> Option<GeneratedImage> {
        lock(&self.state).variation.clone()
    }

    pub fn can_analyze(&self) -> bool {
        !self.flight.is_busy() && lock(&self.state).upload.is_some()
    }

    pub fn can_generate(&self) -> bool {
        !self.flight.is_busy() && lock(&self.state).caption.is_some()
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        let state = lock(&self.state);
        WorkflowSnapshot {
            primary: state.caption.as_ref().map(|c| c.text.clone()),
            secondary: state.variation.as_ref().map(GeneratedImage::data_uri),
            is_loading: state.loading,
            error: state.error.clone(),
        }
    }

    pub fn analyze(&self) -> ActionOutcome {
        let Some(_flight) = self.flight.try_begin() else {
            return ActionOutcome::Ignored(IgnoreReason::Busy);
        };

        let mut state = lock(&self.state);
        if state.upload.is_none() {
            return ActionOutcome::Ignored(IgnoreReason::NoImageSelected);
        }
        state.error = None;
        state.variation = None;
        state.caption = Some(CaptionResult::placeholder());
        log::debug!("Assigned placeholder caption");
        ActionOutcome::Completed
    }

    pub async fn generate_variation(&self) -> ActionOutcome {
        let Some(_flight) = self.flight.try_begin() else {
            return ActionOutcome::Ignored(IgnoreReason::Busy);
        };

        let (upload, caption) = {
            let mut state = lock(&self.state);
            let (Some(upload), Some(caption)) = (state.upload.clone(), state.caption.clone())
            else {
                return ActionOutcome::Ignored(IgnoreReason::NotReady);
            };
            state.loading = true;
            state.error = None;
            state.variation = None;
            (upload, caption)
        };

        let request = self
            .images
            .image_to_image_request(upload, &caption.text, Some(self.strength()));
        let result = self.images.image_to_image(request).await;

        let mut state = lock(&self.state);
        state.loading = false;
        match result {
            Ok(image) => {
                state.variation = Some(image);
                ActionOutcome::Completed
            }
            Err(e) => {
                log::error!("Variation generation failed: {}", e);
                state.error = Some(e.to_string());
                ActionOutcome::Failed
            }
        }
    }
}
