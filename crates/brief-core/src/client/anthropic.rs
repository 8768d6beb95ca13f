use crate::client::{ClientParams, ModelClient, SharedClient};
use crate::http::{join_url, read_body};
use crate::provider::{Credential, ProviderId};
use crate::{InvokeError, ProviderError};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

pub struct AnthropicClient {
    model: String,
    base_url: String,
    api_key: Credential,
    temperature: f32,
    agent: ureq::Agent,
}

impl AnthropicClient {
    pub fn new(params: ClientParams) -> Self {
        Self {
            model: params.model,
            base_url: params
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: params.credential,
            temperature: params.temperature,
            agent: params.agent,
        }
    }

    pub fn shared(params: ClientParams) -> Result<SharedClient, ProviderError> {
        Ok(Arc::new(Self::new(params)))
    }

    fn build_request_body(&self, prompt: &str) -> serde_json::Value {
        json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "temperature": self.temperature,
            "messages": [
                {"role": "user", "content": prompt},
            ],
        })
    }

    fn parse_response(body: &str) -> Result<String, InvokeError> {
        let response: MessagesResponse =
            serde_json::from_str(body).map_err(|e| InvokeError::InvalidResponse(e.to_string()))?;
        let text = response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");
        if text.is_empty() {
            return Err(InvokeError::InvalidResponse("no text content".into()));
        }
        Ok(text)
    }
}

impl ModelClient for AnthropicClient {
    fn provider(&self) -> ProviderId {
        ProviderId::Claude
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn invoke(&self, prompt: &str) -> Result<String, InvokeError> {
        let url = join_url(&self.base_url, "v1/messages");
        let body = self.build_request_body(prompt);

        let raw = read_body(
            self.agent
                .post(&url)
                .header("x-api-key", self.api_key.expose())
                .header("anthropic-version", API_VERSION)
                .send_json(body),
        )?;

        Self::parse_response(raw.trim())
    }
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}
