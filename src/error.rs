use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenFlowError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Request error: {0}")]
    RequestError(String),

    /// Non-success HTTP status returned by a hosted model.
    #[error("{service} request failed with status {status}: {body}")]
    Api {
        service: String,
        status: u16,
        body: String,
    },

    #[error("Response error: {0}")]
    ResponseError(String),

    /// A success response that lacks the field the caller needs.
    #[error("{0}")]
    NoData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl GenFlowError {
    pub fn api(service: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        GenFlowError::Api {
            service: service.into(),
            status,
            body: body.into(),
        }
    }

    /// HTTP status carried by the error, if it came from a hosted endpoint.
    pub fn status(&self) -> Option<u16> {
        match self {
            GenFlowError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for GenFlowError {
    fn from(e: serde_json::Error) -> Self {
        GenFlowError::SerializationError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GenFlowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_message_carries_status_and_body() {
        let err = GenFlowError::api("Hugging Face", 503, "model is loading");
        assert_eq!(
            err.to_string(),
            "Hugging Face request failed with status 503: model is loading"
        );
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn test_no_data_is_displayed_verbatim() {
        let err = GenFlowError::NoData("No image data returned from Stability AI.".into());
        assert_eq!(err.to_string(), "No image data returned from Stability AI.");
        assert_eq!(err.status(), None);
    }
}
