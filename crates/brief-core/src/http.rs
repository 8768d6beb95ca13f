use crate::InvokeError;
use serde_json::Value;
use std::time::Duration;
use ureq::Agent;
use ureq::http::Response;

const MAX_ERROR_CHARS: usize = 300;

/// Agent shared by every backend. Non-2xx statuses are returned as responses so
/// the provider's error message can be surfaced.
pub fn default_agent(timeout: Option<Duration>) -> Agent {
    let config = Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(timeout)
        .build();
    config.into()
}

/// Read a response body, turning transport failures and non-2xx statuses into
/// `InvokeError`.
pub fn read_body(
    result: Result<Response<ureq::Body>, ureq::Error>,
) -> Result<String, InvokeError> {
    let response = result.map_err(|e| InvokeError::Network(e.to_string()))?;
    let status = response.status();
    let body = response
        .into_body()
        .read_to_string()
        .map_err(|e| InvokeError::Network(e.to_string()))?;
    if status.is_success() {
        return Ok(body);
    }
    Err(InvokeError::Status {
        code: status.as_u16(),
        message: error_message(&body),
    })
}

/// Best-effort extraction of a provider error message from an error body.
pub fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        let message = value
            .pointer("/error/message")
            .or_else(|| value.get("error"))
            .or_else(|| value.get("message"))
            .and_then(Value::as_str);
        if let Some(message) = message {
            return truncate(message.trim());
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "empty response body".to_string()
    } else {
        truncate(trimmed)
    }
}

fn truncate(value: &str) -> String {
    match value.char_indices().nth(MAX_ERROR_CHARS) {
        Some((idx, _)) => format!("{}...", &value[..idx]),
        None => value.to_string(),
    }
}

/// Join a base URL and a path without doubling slashes.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
