//! OpenAI API client implementation.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::chat::ChatRequest;
use crate::credential::Credential;
use crate::error::{LlmError, Result};
use crate::message::{ContentPart, Message};

use super::config::OpenAIConfig;
use super::types::{
    OpenAIChatRequest, OpenAIContentPart, OpenAIError, OpenAIErrorResponse, OpenAIImageUrl,
    OpenAIMessage, StreamOptions,
};

/// OpenAI API client.
#[derive(Debug, Clone)]
pub struct OpenAI {
    pub(crate) config: Arc<OpenAIConfig>,
    pub(crate) client: Client,
}

impl OpenAI {
    /// Create a new OpenAI client with the given configuration.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(timeout));
        }

        let client = builder
            .build()
            .map_err(|e| LlmError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }

    /// Get the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Get the default model.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Build the chat completions URL.
    pub(crate) fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// Build a JSON request carrying the session's credential.
    pub(crate) fn build_request(
        &self,
        credential: &Credential,
        url: &str,
    ) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", credential.expose()))
            .header("Content-Type", "application/json");

        if let Some(org) = &self.config.organization {
            req = req.header("OpenAI-Organization", org);
        }

        req
    }

    /// Convert Message to OpenAI format.
    pub(crate) fn convert_message(msg: &Message) -> OpenAIMessage {
        let content = msg
            .content
            .iter()
            .map(|part| match part {
                ContentPart::Text { text } => OpenAIContentPart::Text { text: text.clone() },
                ContentPart::ImageUrl { image_url } => OpenAIContentPart::ImageUrl {
                    image_url: OpenAIImageUrl {
                        url: image_url.url.clone(),
                    },
                },
            })
            .collect();

        OpenAIMessage {
            role: msg.role.as_str().to_owned(),
            content,
        }
    }

    /// Build the streaming request body.
    pub(crate) fn build_body(&self, request: &ChatRequest) -> OpenAIChatRequest {
        let model = if request.model.is_empty() {
            self.config.model.clone()
        } else {
            request.model.clone()
        };

        OpenAIChatRequest {
            model,
            messages: request.messages.iter().map(Self::convert_message).collect(),
            max_tokens: request.max_tokens,
            stream: true,
            stream_options: Some(StreamOptions {
                include_usage: true,
            }),
        }
    }

    /// Parse an error response from OpenAI.
    pub(crate) fn parse_error(status: u16, body: &str) -> LlmError {
        match serde_json::from_str::<OpenAIErrorResponse>(body) {
            Ok(response) => Self::api_error(Some(status), response.error),
            Err(_) => LlmError::http_status(status, body.to_owned()),
        }
    }

    /// Classify an error object, from a response status or sent mid-stream.
    pub(crate) fn api_error(status: Option<u16>, error: OpenAIError) -> LlmError {
        match status {
            Some(401 | 403) => LlmError::auth("openai", error.message),
            Some(429) => LlmError::rate_limited("openai"),
            _ => {
                let code = error
                    .code
                    .or(error.error_type)
                    .or_else(|| status.map(|s| s.to_string()))
                    .unwrap_or_else(|| "unknown".to_owned());
                LlmError::provider_code("openai", code, error.message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImagePayload;

    fn client() -> OpenAI {
        OpenAI::new(OpenAIConfig::new()).expect("client should build")
    }

    #[test]
    fn test_chat_url_tolerates_trailing_slash() {
        let openai =
            OpenAI::new(OpenAIConfig::new().with_base_url("http://localhost:9000/v1/")).unwrap();
        assert_eq!(openai.chat_url(), "http://localhost:9000/v1/chat/completions");
    }

    #[test]
    fn test_body_is_streaming_with_cap() {
        let image = ImagePayload::from_upload("x.png", vec![0_u8; 4]).unwrap();
        let request = ChatRequest::new("")
            .message(Message::user_with_image("Describe", &image))
            .max_tokens(1200);

        let body = client().build_body(&request);
        assert_eq!(body.model, "gpt-4o");
        assert_eq!(body.max_tokens, Some(1200));
        assert!(body.stream);
        assert_eq!(body.messages[0].role, "user");
        assert!(matches!(
            &body.messages[0].content[1],
            OpenAIContentPart::ImageUrl { image_url } if image_url.url == "data:image/jpeg;base64,AAAAAA=="
        ));
    }

    #[test]
    fn test_parse_error_auth() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error","code":"invalid_api_key"}}"#;
        let err = OpenAI::parse_error(401, body);
        assert!(matches!(err, LlmError::Auth { .. }));
        assert!(err.to_string().contains("Incorrect API key"));
    }

    #[test]
    fn test_parse_error_rate_limited() {
        let body = r#"{"error":{"message":"slow down","type":"requests"}}"#;
        assert!(matches!(
            OpenAI::parse_error(429, body),
            LlmError::RateLimited { .. }
        ));
    }

    #[test]
    fn test_parse_error_provider_code() {
        let body = r#"{"error":{"message":"model not found","type":"invalid_request_error","code":"model_not_found"}}"#;
        let err = OpenAI::parse_error(404, body);
        assert!(matches!(err, LlmError::Provider { code: Some(ref c), .. } if c == "model_not_found"));
    }

    #[test]
    fn test_parse_error_raw_body() {
        let err = OpenAI::parse_error(502, "<html>bad gateway</html>");
        assert!(matches!(err, LlmError::HttpStatus { status: 502, .. }));
    }
}
