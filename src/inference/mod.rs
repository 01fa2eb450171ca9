pub mod caption_client;
pub mod dispatcher;
pub mod image_client;
pub mod sentiment_client;
pub mod transport;

use crate::{config::Config, error::Result};
use std::sync::Arc;
use std::time::Duration;

pub use caption_client::CaptionClient;
pub use dispatcher::{Dispatcher, InferenceOutput, Payload};
pub use image_client::ImageClient;
pub use sentiment_client::SentimentClient;
pub use transport::{HttpTransport, ReqwestTransport};

/// Entry point holding one client per hosted service. Services without a
/// configured credential are simply absent.
#[derive(Clone)]
pub struct InferenceClient {
    dispatcher: Option<Dispatcher>,
    sentiment_client: Option<SentimentClient>,
    image_client: Option<ImageClient>,
    caption_client: Option<CaptionClient>,
}

impl InferenceClient {
    pub fn new(config: &Config) -> Result<Self> {
        let transport: Arc<dyn HttpTransport> = match config.request_timeout_secs {
            Some(secs) => Arc::new(ReqwestTransport::with_timeout(Duration::from_secs(secs))?),
            None => Arc::new(ReqwestTransport::new()),
        };
        Self::with_transport(config, transport)
    }

    pub fn with_transport(config: &Config, transport: Arc<dyn HttpTransport>) -> Result<Self> {
        let dispatcher = match config.hugging_face.api_token {
            Some(_) => Some(Dispatcher::new(transport.clone(), &config.hugging_face)?),
            None => None,
        };
        let sentiment_client = dispatcher.clone().map(|dispatcher| {
            SentimentClient::new(dispatcher, config.hugging_face.sentiment_model())
        });
        let image_client = match config.stability.api_key {
            Some(_) => Some(ImageClient::new(transport.clone(), &config.stability)?),
            None => None,
        };
        let caption_client = match config.gemini.api_key {
            Some(_) => Some(CaptionClient::new(transport, &config.gemini)?),
            None => None,
        };

        Ok(Self {
            dispatcher,
            sentiment_client,
            image_client,
            caption_client,
        })
    }

    pub fn dispatcher(&self) -> Result<&Dispatcher> {
        self.dispatcher.as_ref().ok_or_else(|| missing("HF_API_TOKEN"))
    }

    pub fn sentiment(&self) -> Result<&SentimentClient> {
        self.sentiment_client
            .as_ref()
            .ok_or_else(|| missing("HF_API_TOKEN"))
    }

    pub fn image(&self) -> Result<&ImageClient> {
        self.image_client
            .as_ref()
            .ok_or_else(|| missing("STABILITY_API_KEY"))
    }

    pub fn caption(&self) -> Result<&CaptionClient> {
        self.caption_client
            .as_ref()
            .ok_or_else(|| missing("GEMINI_API_KEY"))
    }
}

fn missing(variable: &str) -> crate::GenFlowError {
    crate::GenFlowError::ConfigError(format!("{} is not configured", variable))
}
