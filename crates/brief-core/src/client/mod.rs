pub mod anthropic;
pub mod gemini;
pub mod huggingface;
pub mod ollama;
pub mod openai;

use crate::http::default_agent;
use crate::provider::{Credential, ProviderId, ProviderSpec, lookup};
use crate::{InvokeError, ProviderError};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// A callable bound to one provider, model and credential.
pub trait ModelClient: Send + Sync {
    fn provider(&self) -> ProviderId;
    fn model(&self) -> &str;
    fn invoke(&self, prompt: &str) -> Result<String, InvokeError>;
}

/// Clients are shared between the orchestrator and the session that keeps them
/// around for follow-up questions.
pub type SharedClient = Arc<dyn ModelClient>;

/// Everything a backend constructor receives.
#[derive(Clone)]
pub struct ClientParams {
    pub provider: ProviderId,
    pub model: String,
    pub credential: Credential,
    pub base_url: Option<String>,
    pub temperature: f32,
    pub agent: ureq::Agent,
}

type Constructor = Box<dyn Fn(ClientParams) -> Result<SharedClient, ProviderError> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub temperature: f32,
    /// `None` leaves latency bounded only by the provider.
    pub timeout: Option<Duration>,
    pub base_urls: HashMap<ProviderId, String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            timeout: None,
            base_urls: HashMap::new(),
        }
    }
}

/// Maps provider ids to constructors producing a uniform `ModelClient`.
pub struct ClientFactory {
    constructors: HashMap<ProviderId, Constructor>,
    options: ClientOptions,
}

impl ClientFactory {
    /// A factory with no backends registered.
    pub fn new(options: ClientOptions) -> Self {
        Self {
            constructors: HashMap::new(),
            options,
        }
    }

    /// A factory with every HTTP backend registered.
    pub fn with_defaults(options: ClientOptions) -> Self {
        let mut factory = Self::new(options);
        factory.register(ProviderId::OpenAI, |params| {
            openai::ChatCompletionsClient::shared(params, openai::OPENAI_BASE_URL)
        });
        factory.register(ProviderId::Mistral, |params| {
            openai::ChatCompletionsClient::shared(params, openai::MISTRAL_BASE_URL)
        });
        factory.register(ProviderId::Claude, anthropic::AnthropicClient::shared);
        factory.register(ProviderId::Gemini, gemini::GeminiClient::shared);
        factory.register(ProviderId::HuggingFace, huggingface::HuggingFaceClient::shared);
        factory.register(ProviderId::Ollama, ollama::OllamaClient::shared);
        factory
    }

    /// Register (or replace) the constructor for `provider`.
    pub fn register<F>(&mut self, provider: ProviderId, constructor: F)
    where
        F: Fn(ClientParams) -> Result<SharedClient, ProviderError> + Send + Sync + 'static,
    {
        self.constructors.insert(provider, Box::new(constructor));
    }

    /// Build a client for `provider`/`model`. An empty model selects the
    /// provider's default model.
    pub fn build(
        &self,
        provider: &str,
        model: &str,
        credential: Credential,
    ) -> Result<SharedClient, ProviderError> {
        let spec = lookup(provider)?;
        let model = model.trim();
        let model = if model.is_empty() {
            spec.default_model()
        } else {
            model
        };
        if !spec.supports(model) {
            return Err(ProviderError::UnsupportedModel {
                provider: spec.id.to_string(),
                model: model.to_string(),
            });
        }
        validate_credential(spec, &credential)?;

        let constructor = self.constructors.get(&spec.id).ok_or_else(|| {
            ProviderError::UnsupportedProvider(format!("{} backend is not available", spec.id))
        })?;

        tracing::debug!(provider = %spec.id, model, "building model client");
        constructor(ClientParams {
            provider: spec.id,
            model: model.to_string(),
            credential,
            base_url: self.options.base_urls.get(&spec.id).cloned(),
            temperature: self.options.temperature,
            agent: default_agent(self.options.timeout),
        })
    }
}

fn validate_credential(spec: &ProviderSpec, credential: &Credential) -> Result<(), ProviderError> {
    let invalid = |reason: &str| ProviderError::InvalidCredential {
        provider: spec.id.to_string(),
        reason: reason.to_string(),
    };

    if spec.credential_optional {
        if credential.is_empty() {
            return Ok(());
        }
        return match url::Url::parse(credential.expose()) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
            _ => Err(invalid("endpoint must be an http or https URL")),
        };
    }

    if credential.is_empty() {
        return Err(invalid("credential is empty"));
    }
    if credential
        .expose()
        .chars()
        .any(|ch| ch.is_whitespace() || ch.is_control())
    {
        return Err(invalid("credential contains whitespace or control characters"));
    }
    Ok(())
}
