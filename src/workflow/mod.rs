pub mod image;
pub mod state;
pub mod text;

pub use image::ImageWorkflow;
pub use state::{ActionOutcome, IgnoreReason, WorkflowSnapshot, WorkflowStatus};
pub use text::{TextStage, TextWorkflow};

#[cfg(test)]
pub(crate) fn test_client(
    fake: &std::sync::Arc<crate::inference::transport::testing::FakeTransport>,
) -> crate::inference::InferenceClient {
    use crate::config::{Config, HuggingFaceConfig, StabilityConfig};

    let config = Config::new()
        .with_hugging_face(HuggingFaceConfig::new().with_credentials("hf_test"))
        .with_stability(StabilityConfig::new().with_credentials("sk_test"));
    crate::inference::InferenceClient::with_transport(&config, fake.clone()).unwrap()
}
