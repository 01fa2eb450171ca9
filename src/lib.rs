//! Analyze-then-generate workflows over hosted inference APIs.
//!
//! The text workflow classifies the tone of a prompt and, once the user
//! confirms, renders the prompt with a text-to-image model. The image
//! workflow takes an uploaded picture and produces an image-to-image
//! variation of it.

pub mod config;
pub mod error;
pub mod inference;
pub mod logger;
pub mod models;
pub mod workflow;

pub use config::{Config, GeminiConfig, HuggingFaceConfig, StabilityConfig};
pub use error::{GenFlowError, Result};
pub use inference::{
    CaptionClient, Dispatcher, HttpTransport, ImageClient, InferenceClient, InferenceOutput,
    Payload, ReqwestTransport, SentimentClient,
};
pub use models::*;
pub use workflow::{
    ActionOutcome, IgnoreReason, ImageWorkflow, TextStage, TextWorkflow, WorkflowSnapshot,
    WorkflowStatus,
};
