use crate::ProviderError;
use crate::env::EnvSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The model backends a summary can be generated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProviderId {
    OpenAI,
    Mistral,
    Claude,
    Gemini,
    HuggingFace,
    Ollama,
}

impl ProviderId {
    pub const ALL: [ProviderId; 6] = [
        ProviderId::OpenAI,
        ProviderId::Mistral,
        ProviderId::Claude,
        ProviderId::Gemini,
        ProviderId::HuggingFace,
        ProviderId::Ollama,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderId::OpenAI => "OpenAI",
            ProviderId::Mistral => "Mistral",
            ProviderId::Claude => "Claude",
            ProviderId::Gemini => "Gemini",
            ProviderId::HuggingFace => "Hugging Face",
            ProviderId::Ollama => "Ollama",
        }
    }

    /// Lowercase identifier used for config tables (`providers.<key>`).
    pub fn key(self) -> &'static str {
        match self {
            ProviderId::OpenAI => "openai",
            ProviderId::Mistral => "mistral",
            ProviderId::Claude => "claude",
            ProviderId::Gemini => "gemini",
            ProviderId::HuggingFace => "hugging_face",
            ProviderId::Ollama => "ollama",
        }
    }

    pub fn spec(self) -> &'static ProviderSpec {
        // PROVIDERS is ordered like ProviderId::ALL.
        &PROVIDERS[self as usize]
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ProviderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized: String = value
            .chars()
            .filter(|ch| !matches!(ch, ' ' | '-' | '_'))
            .map(|ch| ch.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "openai" => Ok(ProviderId::OpenAI),
            "mistral" => Ok(ProviderId::Mistral),
            "claude" => Ok(ProviderId::Claude),
            "gemini" => Ok(ProviderId::Gemini),
            "huggingface" | "hf" => Ok(ProviderId::HuggingFace),
            "ollama" => Ok(ProviderId::Ollama),
            _ => Err(ProviderError::UnsupportedProvider(value.trim().to_string())),
        }
    }
}

/// Static description of one provider.
#[derive(Debug)]
pub struct ProviderSpec {
    pub id: ProviderId,
    pub models: &'static [&'static str],
    pub credential_label: &'static str,
    pub credential_help: &'static str,
    pub env_var: &'static str,
    /// Local endpoints need no secret; the credential is an optional endpoint.
    pub credential_optional: bool,
}

impl ProviderSpec {
    pub fn default_model(&self) -> &'static str {
        self.models[0]
    }

    pub fn supports(&self, model: &str) -> bool {
        self.models.contains(&model)
    }
}

pub static PROVIDERS: [ProviderSpec; 6] = [
    ProviderSpec {
        id: ProviderId::OpenAI,
        models: &[
            "gpt-4o-mini",
            "gpt-4o",
            "gpt-4.1",
            "gpt-4.1-mini",
            "gpt-4.1-nano",
        ],
        credential_label: "OpenAI API Key",
        credential_help: "Your OpenAI API key is required.",
        env_var: "OPENAI_API_KEY",
        credential_optional: false,
    },
    ProviderSpec {
        id: ProviderId::Mistral,
        models: &[
            "mistral-small-latest",
            "mistral-large-latest",
            "ministral-8b-latest",
            "ministral-3b-latest",
        ],
        credential_label: "Mistral API Key",
        credential_help: "Your Mistral API key is required.",
        env_var: "MISTRAL_API_KEY",
        credential_optional: false,
    },
    ProviderSpec {
        id: ProviderId::Claude,
        models: &[
            "claude-3-opus-20240229",
            "claude-3-sonnet-20240229",
            "claude-3-haiku-20240307",
        ],
        credential_label: "Claude API Key",
        credential_help: "Your Claude API key is required.",
        env_var: "CLAUDE_API_KEY",
        credential_optional: false,
    },
    ProviderSpec {
        id: ProviderId::Gemini,
        models: &["gemini-1.5-pro-latest", "gemini-1.0-pro-latest"],
        credential_label: "Gemini API Key",
        credential_help: "Your Gemini API key is required.",
        env_var: "GEMINI_API_KEY",
        credential_optional: false,
    },
    ProviderSpec {
        id: ProviderId::HuggingFace,
        models: &[
            "google/flan-t5-xxl",
            "facebook/bart-large-cnn",
            "bigscience/mt0-large",
        ],
        credential_label: "Hugging Face API Key",
        credential_help: "Your Hugging Face API key is required.",
        env_var: "HF_TOKEN",
        credential_optional: false,
    },
    ProviderSpec {
        id: ProviderId::Ollama,
        models: &["llama2", "mistral", "phi3", "codellama"],
        credential_label: "Ollama Endpoint (optional)",
        credential_help: "Ollama usually runs locally. Enter endpoint if not default.",
        env_var: "OLLAMA_ENDPOINT",
        credential_optional: true,
    },
];

pub fn lookup(provider: &str) -> Result<&'static ProviderSpec, ProviderError> {
    provider.parse::<ProviderId>().map(ProviderId::spec)
}

/// A secret (or, for local providers, an endpoint) that must stay out of logs.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_string())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("Credential(<empty>)")
        } else {
            f.write_str("Credential(<redacted>)")
        }
    }
}

/// Pick the credential for `provider`: the supplied value when non-empty,
/// otherwise the provider's environment variable from `env`.
pub fn resolve_credential(
    provider: &str,
    supplied: &str,
    env: &EnvSnapshot,
) -> Result<Credential, ProviderError> {
    let spec = lookup(provider)?;
    let supplied = supplied.trim();
    if !supplied.is_empty() {
        return Ok(Credential::new(supplied));
    }
    if let Some(value) = env.get(spec.env_var) {
        tracing::debug!(
            provider = %spec.id,
            env_var = spec.env_var,
            "credential taken from environment"
        );
        return Ok(Credential::new(value));
    }
    if spec.credential_optional {
        return Ok(Credential::default());
    }
    Err(ProviderError::MissingCredential {
        label: spec.credential_label.to_string(),
        env_var: spec.env_var.to_string(),
    })
}
