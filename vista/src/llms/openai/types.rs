//! OpenAI API request and response types.
//!
//! These map directly to the Chat Completions wire format and stay internal
//! to the client.

use serde::{Deserialize, Serialize};

use crate::stream::Usage;

/// OpenAI chat completion request.
#[derive(Debug, Clone, Serialize)]
pub struct OpenAIChatRequest {
    pub model: String,
    pub messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_options: Option<StreamOptions>,
}

/// Stream options for OpenAI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamOptions {
    pub include_usage: bool,
}

/// OpenAI message format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIMessage {
    pub role: String,
    pub content: Vec<OpenAIContentPart>,
}

/// OpenAI content part.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OpenAIContentPart {
    Text { text: String },
    ImageUrl { image_url: OpenAIImageUrl },
}

/// OpenAI image URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIImageUrl {
    pub url: String,
}

/// OpenAI streaming chunk.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIStreamChunk {
    #[serde(default)]
    pub choices: Vec<OpenAIStreamChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// OpenAI stream choice.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIStreamChoice {
    #[serde(default)]
    pub delta: OpenAIStreamDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// OpenAI stream delta.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenAIStreamDelta {
    #[serde(default)]
    pub content: Option<String>,
}

/// OpenAI error response.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIErrorResponse {
    pub error: OpenAIError,
}

/// OpenAI error details.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIError {
    pub message: String,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = OpenAIChatRequest {
            model: "gpt-4o".to_owned(),
            messages: vec![OpenAIMessage {
                role: "user".to_owned(),
                content: vec![
                    OpenAIContentPart::Text {
                        text: "Describe".to_owned(),
                    },
                    OpenAIContentPart::ImageUrl {
                        image_url: OpenAIImageUrl {
                            url: "data:image/jpeg;base64,AA==".to_owned(),
                        },
                    },
                ],
            }],
            max_tokens: Some(1200),
            stream: true,
            stream_options: None,
        };

        let json = serde_json::to_value(&request).expect("serialization should succeed");
        assert_eq!(
            json,
            serde_json::json!({
                "model": "gpt-4o",
                "messages": [{
                    "role": "user",
                    "content": [
                        {"type": "text", "text": "Describe"},
                        {"type": "image_url", "image_url": {"url": "data:image/jpeg;base64,AA=="}}
                    ]
                }],
                "max_tokens": 1200,
                "stream": true
            })
        );
    }

    #[test]
    fn test_stream_chunk_deserialization() {
        let json = r#"{"id":"chatcmpl-1","object":"chat.completion.chunk","created":1,"model":"gpt-4o","choices":[{"index":0,"delta":{"role":"assistant","content":"Hola"},"finish_reason":null}]}"#;

        let chunk: OpenAIStreamChunk =
            serde_json::from_str(json).expect("deserialization should succeed");
        assert_eq!(chunk.choices.len(), 1);
        assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("Hola"));
        assert!(chunk.usage.is_none());
    }

    #[test]
    fn test_error_response_deserialization() {
        let json = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error","param":null,"code":"invalid_api_key"}}"#;

        let response: OpenAIErrorResponse =
            serde_json::from_str(json).expect("deserialization should succeed");
        assert_eq!(response.error.code.as_deref(), Some("invalid_api_key"));
    }
}
