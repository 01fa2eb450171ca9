use std::env;
use std::str::FromStr;

pub const DEFAULT_HF_BASE_URL: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_SENTIMENT_MODEL: &str = "cardiffnlp/twitter-roberta-base-sentiment";
pub const DEFAULT_STABILITY_BASE_URL: &str = "https://api.stability.ai";
pub const DEFAULT_STABILITY_ENGINE: &str = "stable-diffusion-xl-1024-v1-0";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_STRENGTH: f32 = 0.35;

#[derive(Debug, Clone)]
pub struct HuggingFaceConfig {
    pub api_token: Option<String>,
    pub base_url: Option<String>,
    pub sentiment_model: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StabilityConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub engine_id: Option<String>,
    pub cfg_scale: Option<f32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub steps: Option<u32>,
    pub samples: Option<u32>,
    pub image_strength: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub hugging_face: HuggingFaceConfig,
    pub stability: StabilityConfig,
    pub gemini: GeminiConfig,
    pub request_timeout_secs: Option<u64>,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        HuggingFaceConfig {
            api_token: None,
            base_url: None,
            sentiment_model: None,
        }
    }
}

impl HuggingFaceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_token = env::var("HF_API_TOKEN").ok();
        let base_url = env::var("HF_BASE_URL").ok();
        let sentiment_model = env::var("HF_SENTIMENT_MODEL").ok();

        HuggingFaceConfig {
            api_token,
            base_url,
            sentiment_model,
        }
    }

    pub fn with_credentials(mut self, api_token: impl Into<String>) -> Self {
        self.api_token = Some(api_token.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_sentiment_model(mut self, model: impl Into<String>) -> Self {
        self.sentiment_model = Some(model.into());
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_HF_BASE_URL)
    }

    pub fn sentiment_model(&self) -> &str {
        self.sentiment_model
            .as_deref()
            .unwrap_or(DEFAULT_SENTIMENT_MODEL)
    }
}

impl Default for StabilityConfig {
    fn default() -> Self {
        StabilityConfig {
            api_key: None,
            base_url: None,
            engine_id: None,
            cfg_scale: None,
            width: None,
            height: None,
            steps: None,
            samples: None,
            image_strength: None,
        }
    }
}

impl StabilityConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_key = env::var("STABILITY_API_KEY").ok();
        let base_url = env::var("STABILITY_BASE_URL").ok();
        let engine_id = env::var("STABILITY_ENGINE_ID").ok();
        let image_strength =
            parse_value("STABILITY_IMAGE_STRENGTH", env::var("STABILITY_IMAGE_STRENGTH").ok());

        StabilityConfig {
            api_key,
            base_url,
            engine_id,
            image_strength,
            ..Default::default()
        }
    }

    pub fn with_credentials(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_engine(mut self, engine_id: impl Into<String>) -> Self {
        self.engine_id = Some(engine_id.into());
        self
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_sampling(mut self, cfg_scale: f32, steps: u32, samples: u32) -> Self {
        self.cfg_scale = Some(cfg_scale);
        self.steps = Some(steps);
        self.samples = Some(samples);
        self
    }

    pub fn with_image_strength(mut self, strength: f32) -> Self {
        self.image_strength = Some(strength);
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_STABILITY_BASE_URL)
    }

    pub fn engine_id(&self) -> &str {
        self.engine_id.as_deref().unwrap_or(DEFAULT_STABILITY_ENGINE)
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            api_key: None,
            base_url: None,
            model: None,
        }
    }
}

impl GeminiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_key = env::var("GEMINI_API_KEY").ok();
        let base_url = env::var("GEMINI_BASE_URL").ok();
        let model = env::var("GEMINI_MODEL").ok();

        GeminiConfig {
            api_key,
            base_url,
            model,
        }
    }

    pub fn with_credentials(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_GEMINI_BASE_URL)
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            hugging_face: HuggingFaceConfig::default(),
            stability: StabilityConfig::default(),
            gemini: GeminiConfig::default(),
            request_timeout_secs: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the process environment. Clients never consult the
    /// environment themselves; whatever is read here is all they get.
    pub fn from_env() -> Self {
        let request_timeout_secs = parse_value(
            "GENFLOW_REQUEST_TIMEOUT_SECS",
            env::var("GENFLOW_REQUEST_TIMEOUT_SECS").ok(),
        );

        Config {
            hugging_face: HuggingFaceConfig::from_env(),
            stability: StabilityConfig::from_env(),
            gemini: GeminiConfig::from_env(),
            request_timeout_secs,
        }
    }

    pub fn with_hugging_face(mut self, config: HuggingFaceConfig) -> Self {
        self.hugging_face = config;
        self
    }

    pub fn with_stability(mut self, config: StabilityConfig) -> Self {
        self.stability = config;
        self
    }

    pub fn with_gemini(mut self, config: GeminiConfig) -> Self {
        self.gemini = config;
        self
    }

    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }
}

/// Unparsable values are dropped with a warning so the default applies.
fn parse_value<T: FromStr>(name: &str, raw: Option<String>) -> Option<T> {
    let raw = raw?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring {}={:?}: not a valid value, using the default", name, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fall_back_to_hosted_endpoints() {
        let config = Config::new();
        assert_eq!(config.hugging_face.base_url(), DEFAULT_HF_BASE_URL);
        assert_eq!(
            config.hugging_face.sentiment_model(),
            "cardiffnlp/twitter-roberta-base-sentiment"
        );
        assert_eq!(config.stability.engine_id(), "stable-diffusion-xl-1024-v1-0");
        assert_eq!(config.gemini.model(), "gemini-2.5-flash");
        assert!(config.hugging_face.api_token.is_none());
    }

    #[test]
    fn test_builders_override_defaults() {
        let config = Config::new()
            .with_hugging_face(
                HuggingFaceConfig::new()
                    .with_credentials("hf_token")
                    .with_base_url("http://localhost:9000"),
            )
            .with_stability(
                StabilityConfig::new()
                    .with_credentials("sk-test")
                    .with_dimensions(512, 512)
                    .with_image_strength(0.6),
            )
            .with_request_timeout(30);

        assert_eq!(config.hugging_face.api_token.as_deref(), Some("hf_token"));
        assert_eq!(config.hugging_face.base_url(), "http://localhost:9000");
        assert_eq!(config.stability.width, Some(512));
        assert_eq!(config.stability.image_strength, Some(0.6));
        assert_eq!(config.request_timeout_secs, Some(30));
    }

    #[test]
    fn test_unparsable_numbers_fall_back_to_default() {
        assert_eq!(parse_value::<f32>("STABILITY_IMAGE_STRENGTH", Some("0.5".into())), Some(0.5));
        assert_eq!(parse_value::<f32>("STABILITY_IMAGE_STRENGTH", Some("0,5".into())), None);
        assert_eq!(parse_value::<u64>("GENFLOW_REQUEST_TIMEOUT_SECS", Some(" 30 ".into())), Some(30));
        assert_eq!(parse_value::<u64>("GENFLOW_REQUEST_TIMEOUT_SECS", Some("30s".into())), None);
        assert_eq!(parse_value::<u64>("GENFLOW_REQUEST_TIMEOUT_SECS", None), None);
    }
}
