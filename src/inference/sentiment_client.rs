use crate::{
    error::{GenFlowError, Result},
    inference::dispatcher::Dispatcher,
    models::{AnalysisResult, ClassificationResponse, SentimentRequest},
};

#[derive(Clone)]
pub struct SentimentClient {
    dispatcher: Dispatcher,
    model_id: String,
}

impl SentimentClient {
    pub fn new(dispatcher: Dispatcher, model_id: impl Into<String>) -> Self {
        Self {
            dispatcher,
            model_id: model_id.into(),
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Classifies the prompt and returns the first (highest ranked) record.
    pub async fn analyze(&self, prompt: &str) -> Result<AnalysisResult> {
        let payload = serde_json::to_value(SentimentRequest::new(prompt))?;
        let value = self
            .dispatcher
            .query(&self.model_id, payload)
            .await?
            .into_structured()?;

        let response: ClassificationResponse = serde_json::from_value(value)
            .map_err(|e| GenFlowError::ResponseError(format!("Unexpected classification shape: {}", e)))?;

        let result = response
            .into_first()
            .ok_or_else(|| GenFlowError::NoData("No analysis returned from the classifier.".into()))?;

        log::info!("Tone analysis: {}", result);
        Ok(result)
    }
}
