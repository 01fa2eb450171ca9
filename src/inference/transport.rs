use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

use crate::error::{GenFlowError, Result};

#[derive(Debug, Clone)]
pub enum FormValue {
    Text(String),
    File {
        bytes: Vec<u8>,
        file_name: String,
        media_type: String,
    },
}

#[derive(Debug, Clone)]
pub struct FormPart {
    pub name: String,
    pub value: FormValue,
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl ToString) -> Self {
        Self {
            name: name.into(),
            value: FormValue::Text(value.to_string()),
        }
    }

    pub fn file(
        name: impl Into<String>,
        bytes: Vec<u8>,
        file_name: impl Into<String>,
        media_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: FormValue::File {
                bytes,
                file_name: file_name.into(),
                media_type: media_type.into(),
            },
        }
    }
}

/// JSON bodies go out as `application/json`; binary bodies carry no
/// content type of their own.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(serde_json::Value),
    Binary(Vec<u8>),
    Multipart(Vec<FormPart>),
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub bearer_token: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl HttpRequest {
    pub fn post(url: impl Into<String>, body: RequestBody) -> Self {
        Self {
            url: url.into(),
            bearer_token: None,
            headers: Vec::new(),
            body,
        }
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenFlowError::ConfigError(format!("HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    fn build_form(parts: Vec<FormPart>) -> Result<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new();
        for part in parts {
            form = match part.value {
                FormValue::Text(text) => form.text(part.name, text),
                FormValue::File {
                    bytes,
                    file_name,
                    media_type,
                } => {
                    let file = reqwest::multipart::Part::bytes(bytes)
                        .file_name(file_name)
                        .mime_str(&media_type)
                        .map_err(|e| GenFlowError::RequestError(e.to_string()))?;
                    form.part(part.name, file)
                }
            };
        }
        Ok(form)
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self.client.post(&request.url);

        if let Some(token) = &request.bearer_token {
            builder = builder.bearer_auth(token);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match request.body {
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Binary(bytes) => builder.body(bytes),
            RequestBody::Multipart(parts) => builder.multipart(Self::build_form(parts)?),
        };

        // URLs may carry a key in the query string; keep them out of errors
        let response = builder.send().await.map_err(|e| {
            let e = e.without_url();
            log::error!("Transport failure: {}", e);
            GenFlowError::RequestError(e.to_string())
        })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(String::from);
        let body = response
            .bytes()
            .await
            .map_err(|e| GenFlowError::ResponseError(e.without_url().to_string()))?
            .to_vec();

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use tokio::sync::Notify;

    pub fn json_response(status: u16, value: serde_json::Value) -> HttpResponse {
        HttpResponse {
            status,
            content_type: Some("application/json; charset=utf-8".to_string()),
            body: serde_json::to_vec(&value).unwrap(),
        }
    }

    pub fn raw_response(status: u16, content_type: Option<&str>, body: &[u8]) -> HttpResponse {
        HttpResponse {
            status,
            content_type: content_type.map(String::from),
            body: body.to_vec(),
        }
    }

    /// Records every request and answers from a script, in order.
    #[derive(Default)]
    pub struct FakeTransport {
        responses: Mutex<VecDeque<Result<HttpResponse>>>,
        requests: Mutex<Vec<HttpRequest>>,
        gate: Option<(Arc<Notify>, Arc<Notify>)>,
    }

    impl FakeTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every `send` signals `entered` and then parks until `release`.
        pub fn gated(entered: Arc<Notify>, release: Arc<Notify>) -> Self {
            Self {
                gate: Some((entered, release)),
                ..Self::default()
            }
        }

        pub fn respond(self, response: HttpResponse) -> Self {
            self.responses.lock().unwrap().push_back(Ok(response));
            self
        }

        pub fn respond_json(self, status: u16, value: serde_json::Value) -> Self {
            self.respond(json_response(status, value))
        }

        pub fn fail(self, message: &str) -> Self {
            self.responses
                .lock()
                .unwrap()
                .push_back(Err(GenFlowError::RequestError(message.to_string())));
            self
        }

        pub fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl HttpTransport for FakeTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
            self.requests.lock().unwrap().push(request);

            if let Some((entered, release)) = &self.gate {
                entered.notify_one();
                release.notified().await;
            }

            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(GenFlowError::RequestError("no scripted response".into())))
        }
    }
}
