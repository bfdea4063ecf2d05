//! HttpGateway - talks to a running phyto server.

use crate::error::GatewayError;
use crate::gateway::DiagnosisGateway;
use async_trait::async_trait;
use phyto_core::advisory::AdvisoryRequest;
use phyto_core::classification::{ClassificationResult, Confidence, ImagePayload};
use phyto_core::wire::{ChatRequest, ChatResponse, ClassifyResponse, ErrorResponse};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";
const DEFAULT_CHAT_TIMEOUT: Duration = Duration::from_secs(30);

/// Gateway client for the `/classify` and `/chat` endpoints.
#[derive(Clone, Debug)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    chat_timeout: Duration,
}

impl HttpGateway {
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.as_ref().trim_end_matches('/').to_string(),
            chat_timeout: DEFAULT_CHAT_TIMEOUT,
        }
    }

    pub fn with_chat_timeout(mut self, timeout: Duration) -> Self {
        self.chat_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn image_part(image: &ImagePayload) -> Part {
        let file_name = image
            .file_name
            .clone()
            .unwrap_or_else(|| "leaf.jpg".to_string());
        let part = Part::bytes(image.bytes.clone()).file_name(file_name.clone());
        match part.mime_str(image.mime_or_default()) {
            Ok(part) => part,
            Err(_) => Part::bytes(image.bytes.clone()).file_name(file_name),
        }
    }

    async fn rejection(response: Response) -> GatewayError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or_else(|_| format!("HTTP {status}"));
        GatewayError::Rejected { status, message }
    }

    fn map_transport_error(err: reqwest::Error, budget: Duration) -> GatewayError {
        if err.is_timeout() {
            GatewayError::Timeout { budget }
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

impl Default for HttpGateway {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait]
impl DiagnosisGateway for HttpGateway {
    async fn classify(&self, image: &ImagePayload) -> Result<ClassificationResult, GatewayError> {
        let form = Form::new().part("image", Self::image_part(image));

        let response = self
            .client
            .post(self.url("/classify"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        // A 200 carrying `{error}` is still a failure.
        if let Ok(ErrorResponse { error }) = serde_json::from_str::<ErrorResponse>(&body) {
            return Err(GatewayError::Rejected {
                status: 200,
                message: error,
            });
        }

        let reply: ClassifyResponse =
            serde_json::from_str(&body).map_err(|e| GatewayError::Decode(e.to_string()))?;
        let confidence = Confidence::new(reply.confidence).ok_or_else(|| {
            GatewayError::Decode(format!("confidence {} out of range", reply.confidence))
        })?;

        Ok(ClassificationResult::new(reply.prediction, confidence).with_alternatives(reply.alternatives))
    }

    async fn chat(&self, request: &AdvisoryRequest) -> Result<String, GatewayError> {
        let response = self
            .client
            .post(self.url("/chat"))
            .timeout(self.chat_timeout)
            .json(&ChatRequest::from(request))
            .send()
            .await
            .map_err(|e| Self::map_transport_error(e, self.chat_timeout))?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        Ok(reply.response.unwrap_or_default())
    }
}
