use crate::client::{ClientParams, ModelClient, SharedClient};
use crate::http::{join_url, read_body};
use crate::provider::{Credential, ProviderId};
use crate::{InvokeError, ProviderError};
use serde_json::{Value, json};
use std::sync::Arc;

const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";

/// Hosted inference endpoint. Text2text and summarization models answer with
/// `generated_text` or `summary_text` respectively.
pub struct HuggingFaceClient {
    model: String,
    base_url: String,
    token: Credential,
    agent: ureq::Agent,
}

impl HuggingFaceClient {
    pub fn new(params: ClientParams) -> Self {
        Self {
            model: params.model,
            base_url: params
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            token: params.credential,
            agent: params.agent,
        }
    }

    pub fn shared(params: ClientParams) -> Result<SharedClient, ProviderError> {
        Ok(Arc::new(Self::new(params)))
    }

    fn build_request_body(prompt: &str) -> Value {
        json!({
            "inputs": prompt,
            "options": {"wait_for_model": true},
        })
    }

    fn parse_response(body: &str) -> Result<String, InvokeError> {
        let value: Value =
            serde_json::from_str(body).map_err(|e| InvokeError::InvalidResponse(e.to_string()))?;
        let first = match &value {
            Value::Array(items) => items
                .first()
                .ok_or_else(|| InvokeError::InvalidResponse("empty result list".into()))?,
            other => other,
        };
        first
            .get("generated_text")
            .or_else(|| first.get("summary_text"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| InvokeError::InvalidResponse("no generated text".into()))
    }
}

impl ModelClient for HuggingFaceClient {
    fn provider(&self) -> ProviderId {
        ProviderId::HuggingFace
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn invoke(&self, prompt: &str) -> Result<String, InvokeError> {
        let url = join_url(&self.base_url, &format!("models/{}", self.model));

        let raw = read_body(
            self.agent
                .post(&url)
                .header("Authorization", &format!("Bearer {}", self.token.expose()))
                .send_json(Self::build_request_body(prompt)),
        )?;

        Self::parse_response(raw.trim())
    }
}
