use crate::client::{ClientParams, ModelClient, SharedClient};
use crate::http::{join_url, read_body};
use crate::provider::{Credential, ProviderId};
use crate::{InvokeError, ProviderError};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const MISTRAL_BASE_URL: &str = "https://api.mistral.ai/v1";

/// Client for OpenAI-compatible `chat/completions` endpoints (OpenAI, Mistral).
pub struct ChatCompletionsClient {
    provider: ProviderId,
    model: String,
    base_url: String,
    api_key: Credential,
    temperature: f32,
    agent: ureq::Agent,
}

impl ChatCompletionsClient {
    pub fn new(params: ClientParams, default_base_url: &str) -> Self {
        Self {
            provider: params.provider,
            model: params.model,
            base_url: params
                .base_url
                .unwrap_or_else(|| default_base_url.to_string()),
            api_key: params.credential,
            temperature: params.temperature,
            agent: params.agent,
        }
    }

    pub fn shared(
        params: ClientParams,
        default_base_url: &str,
    ) -> Result<SharedClient, ProviderError> {
        Ok(Arc::new(Self::new(params, default_base_url)))
    }

    fn build_request_body(&self, prompt: &str) -> serde_json::Value {
        json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": prompt},
            ],
            "temperature": self.temperature,
        })
    }

    fn parse_response(body: &str) -> Result<String, InvokeError> {
        let response: ChatResponse =
            serde_json::from_str(body).map_err(|e| InvokeError::InvalidResponse(e.to_string()))?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| InvokeError::InvalidResponse("no choices".into()))?;
        choice
            .message
            .content
            .ok_or_else(|| InvokeError::InvalidResponse("choice has no content".into()))
    }
}

impl ModelClient for ChatCompletionsClient {
    fn provider(&self) -> ProviderId {
        self.provider
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn invoke(&self, prompt: &str) -> Result<String, InvokeError> {
        let url = join_url(&self.base_url, "chat/completions");
        let body = self.build_request_body(prompt);

        let raw = read_body(
            self.agent
                .post(&url)
                .header("Authorization", &format!("Bearer {}", self.api_key.expose()))
                .send_json(body),
        )?;

        Self::parse_response(raw.trim())
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}
