use thiserror::Error;

/// Errors from file and URL text extraction.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("error processing file: {0}")]
    Extraction(String),

    #[error("error fetching URL: {0}")]
    Fetch(String),
}

/// Errors from provider lookup, credential resolution and client construction.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("model {model} is not available for {provider}")]
    UnsupportedModel { provider: String, model: String },

    #[error("missing credential: enter your {label} or set {env_var}")]
    MissingCredential { label: String, env_var: String },

    #[error("invalid credential for {provider}: {reason}")]
    InvalidCredential { provider: String, reason: String },
}

/// Errors from a single model invocation.
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("network error: {0}")]
    Network(String),

    #[error("provider returned status {code}: {message}")]
    Status { code: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Errors from the summarization orchestrator.
#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("input text is empty")]
    InputEmpty,

    #[error("invalid chunking policy: {0}")]
    Policy(String),

    #[error("model invocation failed: {0}")]
    Invocation(#[from] InvokeError),
}

/// Everything a "generate summary" or follow-up question can fail with.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Summarize(#[from] SummarizeError),

    #[error("no summary yet; generate one before asking questions")]
    NoSummary,
}

impl From<InvokeError> for PipelineError {
    fn from(value: InvokeError) -> Self {
        PipelineError::Summarize(SummarizeError::Invocation(value))
    }
}
