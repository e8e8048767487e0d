//! OpenAI `ChatProvider` implementation.

use async_trait::async_trait;

use crate::chat::{ChatProvider, ChatRequest};
use crate::credential::Credential;
use crate::error::Result;
use crate::stream::ChunkStream;

use super::client::OpenAI;
use super::stream::chunk_stream;

#[async_trait]
impl ChatProvider for OpenAI {
    async fn chat_stream(
        &self,
        credential: &Credential,
        request: &ChatRequest,
    ) -> Result<ChunkStream> {
        let url = self.chat_url();
        let body = self.build_body(request);

        tracing::debug!(
            url = %url,
            model = %body.model,
            max_tokens = ?body.max_tokens,
            "opening OpenAI completion stream"
        );

        let response = self
            .build_request(credential, &url)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Self::parse_error(status.as_u16(), &error_text).into());
        }

        Ok(chunk_stream(response.bytes_stream()))
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}
