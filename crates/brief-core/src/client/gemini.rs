use crate::client::{ClientParams, ModelClient, SharedClient};
use crate::http::{join_url, read_body};
use crate::provider::{Credential, ProviderId};
use crate::{InvokeError, ProviderError};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub struct GeminiClient {
    model: String,
    base_url: String,
    api_key: Credential,
    temperature: f32,
    agent: ureq::Agent,
}

impl GeminiClient {
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

    fn endpoint(&self) -> String {
        join_url(
            &self.base_url,
            &format!("v1beta/models/{}:generateContent", self.model),
        )
    }

    fn build_request_body(&self, prompt: &str) -> serde_json::Value {
        json!({
            "contents": [
                {"role": "user", "parts": [{"text": prompt}]},
            ],
            "generationConfig": {"temperature": self.temperature},
        })
    }

    fn parse_response(body: &str) -> Result<String, InvokeError> {
        let response: GenerateResponse =
            serde_json::from_str(body).map_err(|e| InvokeError::InvalidResponse(e.to_string()))?;
        let candidate = response.candidates.into_iter().next().ok_or_else(|| {
            let reason = response
                .prompt_feedback
                .and_then(|feedback| feedback.block_reason)
                .unwrap_or_else(|| "no candidates".to_string());
            InvokeError::InvalidResponse(reason)
        })?;
        let text = candidate
            .content
            .map(|content| content.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|part| part.text)
            .collect::<Vec<_>>()
            .join("");
        if text.is_empty() {
            return Err(InvokeError::InvalidResponse("candidate has no text".into()));
        }
        Ok(text)
    }
}

impl ModelClient for GeminiClient {
    fn provider(&self) -> ProviderId {
        ProviderId::Gemini
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn invoke(&self, prompt: &str) -> Result<String, InvokeError> {
        let body = self.build_request_body(prompt);

        // Key goes in a header so it never shows up in URL-bearing errors.
        let raw = read_body(
            self.agent
                .post(&self.endpoint())
                .header("x-goog-api-key", self.api_key.expose())
                .send_json(body),
        )?;

        Self::parse_response(raw.trim())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::GeminiClient;
    use crate::InvokeError;
    use crate::client::ClientParams;
    use crate::http::default_agent;
    use crate::provider::{Credential, ProviderId};

    fn client() -> GeminiClient {
        GeminiClient::new(ClientParams {
            provider: ProviderId::Gemini,
            model: "gemini-1.5-pro-latest".to_string(),
            credential: Credential::new("secret-key"),
            base_url: None,
            temperature: 0.3,
            agent: default_agent(None),
        })
    }

    #[test]
    fn endpoint_keeps_key_out_of_url() {
        let url = client().endpoint();
        assert_eq!(
            url,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-pro-latest:generateContent"
        );
        assert!(!url.contains("secret-key"));
    }

    #[test]
    fn parse_response_joins_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"world"}],"role":"model"}}]}"#;
        assert_eq!(GeminiClient::parse_response(body).unwrap(), "Hello world");
    }

    #[test]
    fn parse_response_reports_block_reason() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let err = GeminiClient::parse_response(body).unwrap_err();
        assert!(matches!(err, InvokeError::InvalidResponse(reason) if reason == "SAFETY"));
    }

    #[test]
    fn build_request_body_wraps_prompt_in_parts() {
        let body = client().build_request_body("summarize");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "summarize");
        assert!(body["generationConfig"]["temperature"].is_number());
    }
}
