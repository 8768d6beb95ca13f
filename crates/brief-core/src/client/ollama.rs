use crate::client::{ClientParams, ModelClient, SharedClient};
use crate::http::{join_url, read_body};
use crate::provider::ProviderId;
use crate::{InvokeError, ProviderError};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

pub struct OllamaClient {
    model: String,
    endpoint: String,
    temperature: f32,
    agent: ureq::Agent,
}

impl OllamaClient {
    /// The credential, when present, is the endpoint; it takes precedence over
    /// a configured base URL.
    pub fn new(params: ClientParams) -> Self {
        let endpoint = if params.credential.is_empty() {
            params
                .base_url
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
        } else {
            params.credential.expose().to_string()
        };
        Self {
            model: params.model,
            endpoint,
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
            "prompt": prompt,
            "stream": false,
            "options": {"temperature": self.temperature},
        })
    }

    /// Accepts a single object or newline-delimited chunks.
    fn parse_response(raw: &str) -> Result<String, InvokeError> {
        let mut full_text = String::new();
        for line in raw.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let chunk: OllamaChunk = serde_json::from_str(line)
                .map_err(|e| InvokeError::InvalidResponse(e.to_string()))?;
            if let Some(error) = chunk.error {
                return Err(InvokeError::InvalidResponse(error));
            }
            if let Some(token) = chunk.response {
                full_text.push_str(&token);
            }
            if chunk.done.unwrap_or(false) {
                break;
            }
        }
        if full_text.trim().is_empty() {
            return Err(InvokeError::InvalidResponse("empty response".into()));
        }
        Ok(full_text)
    }
}

impl ModelClient for OllamaClient {
    fn provider(&self) -> ProviderId {
        ProviderId::Ollama
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn invoke(&self, prompt: &str) -> Result<String, InvokeError> {
        let url = join_url(&self.endpoint, "api/generate");
        let raw = read_body(
            self.agent
                .post(&url)
                .send_json(self.build_request_body(prompt)),
        )?;
        Self::parse_response(&raw)
    }
}

#[derive(Deserialize)]
struct OllamaChunk {
    response: Option<String>,
    done: Option<bool>,
    error: Option<String>,
}
