use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize)]
pub struct SentimentRequest {
    pub inputs: String,
}

impl SentimentRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            inputs: prompt.into(),
        }
    }
}

/// One classification record: a category tag and its confidence in 0.0..=1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub label: String,
    pub score: f64,
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Score: {:.2})", self.label, self.score)
    }
}

/// The hosted classifier answers either `[{label, score}, ...]` or, for
/// batched inputs, `[[{label, score}, ...]]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ClassificationResponse {
    Nested(Vec<Vec<AnalysisResult>>),
    Flat(Vec<AnalysisResult>),
}

impl ClassificationResponse {
    pub fn into_first(self) -> Option<AnalysisResult> {
        match self {
            ClassificationResponse::Nested(batches) => {
                batches.into_iter().next().and_then(|b| b.into_iter().next())
            }
            ClassificationResponse::Flat(records) => records.into_iter().next(),
        }
    }
}
