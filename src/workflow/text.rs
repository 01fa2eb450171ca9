use std::sync::Mutex;

use crate::{
    error::Result,
    inference::{ImageClient, InferenceClient, SentimentClient},
    models::{AnalysisResult, GeneratedImage},
    workflow::state::{lock, ActionOutcome, IgnoreReason, SingleFlight, WorkflowSnapshot},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStage {
    Idle,
    Analyzing,
    Analyzed,
    Generating,
    Done,
}

#[derive(Debug)]
struct TextState {
    prompt: String,
    analyzed_prompt: String,
    stage: TextStage,
    analysis: Option<AnalysisResult>,
    image: Option<GeneratedImage>,
    error: Option<String>,
}

/// Prompt → tone analysis → (user confirms) → text-to-image.
///
/// The analysis only unlocks generation; the image request carries the
/// prompt that was analyzed, not the tone.
pub struct TextWorkflow {
    sentiment: SentimentClient,
    images: ImageClient,
    flight: SingleFlight,
    state: Mutex<TextState>,
}

impl TextWorkflow {
    pub fn new(sentiment: SentimentClient, images: ImageClient) -> Self {
        Self {
            sentiment,
            images,
            flight: SingleFlight::default(),
            state: Mutex::new(TextState {
                prompt: String::new(),
                analyzed_prompt: String::new(),
                stage: TextStage::Idle,
                analysis: None,
                image: None,
                error: None,
            }),
        }
    }

    pub fn from_client(client: &InferenceClient) -> Result<Self> {
        Ok(Self::new(client.sentiment()?.clone(), client.image()?.clone()))
    }

    pub fn set_prompt(&self, prompt: impl Into<String>) {
        lock(&self.state).prompt = prompt.into();
    }

    pub fn prompt(&self) -> String {
        lock(&self.state).prompt.clone()
    }

    pub fn stage(&self) -> TextStage {
        lock(&self.state).stage
    }

    pub fn analysis(&self) -> Option<AnalysisResult> {
        lock(&self.state).analysis.clone()
    }

    pub fn image(&self) -> Option<GeneratedImage> {
        lock(&self.state).image.clone()
    }

    pub fn can_analyze(&self) -> bool {
        !self.flight.is_busy() && !lock(&self.state).prompt.trim().is_empty()
    }

    pub fn can_generate(&self) -> bool {
        !self.flight.is_busy()
            && matches!(
                lock(&self.state).stage,
                TextStage::Analyzed | TextStage::Done
            )
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        let state = lock(&self.state);
        WorkflowSnapshot {
            primary: state.analysis.as_ref().map(|a| a.to_string()),
            secondary: state.image.as_ref().map(GeneratedImage::data_uri),
            is_loading: matches!(state.stage, TextStage::Analyzing | TextStage::Generating),
            error: state.error.clone(),
        }
    }

    pub async fn analyze(&self) -> ActionOutcome {
        let Some(_flight) = self.flight.try_begin() else {
            return ActionOutcome::Ignored(IgnoreReason::Busy);
        };

        let prompt = {
            let mut state = lock(&self.state);
            if state.prompt.trim().is_empty() {
                return ActionOutcome::Ignored(IgnoreReason::EmptyPrompt);
            }
            state.stage = TextStage::Analyzing;
            state.analysis = None;
            state.image = None;
            state.error = None;
            state.prompt.clone()
        };

        let result = self.sentiment.analyze(&prompt).await;

        let mut state = lock(&self.state);
        match result {
            Ok(analysis) => {
                state.analysis = Some(analysis);
                state.analyzed_prompt = prompt;
                state.stage = TextStage::Analyzed;
                ActionOutcome::Completed
            }
            Err(e) => {
                log::error!("Prompt analysis failed: {}", e);
                state.error = Some(e.to_string());
                state.stage = TextStage::Idle;
                ActionOutcome::Failed
            }
        }
    }

    pub async fn generate_image(&self) -> ActionOutcome {
        let Some(_flight) = self.flight.try_begin() else {
            return ActionOutcome::Ignored(IgnoreReason::Busy);
        };

        let prompt = {
            let mut state = lock(&self.state);
            if !matches!(state.stage, TextStage::Analyzed | TextStage::Done) {
                return ActionOutcome::Ignored(IgnoreReason::NotReady);
            }
            state.stage = TextStage::Generating;
            state.image = None;
            state.error = None;
            state.analyzed_prompt.clone()
        };

        let request = self.images.text_to_image_request(&prompt);
        let result = self.images.text_to_image(request).await;

        let mut state = lock(&self.state);
        match result {
            Ok(image) => {
                state.image = Some(image);
                state.stage = TextStage::Done;
                ActionOutcome::Completed
            }
            Err(e) => {
                log::error!("Image generation failed: {}", e);
                state.error = Some(e.to_string());
                state.stage = TextStage::Analyzed;
                ActionOutcome::Failed
            }
        }
    }
}
