use crate::ExtractError;
use ureq::Agent;

const FETCH_RENDER_WIDTH: usize = 100;

/// Fetch a web page and return its readable text.
pub fn fetch_url(agent: &Agent, raw_url: &str) -> Result<String, ExtractError> {
    let url = validate_url(raw_url)?;

    let response = agent
        .get(url.as_str())
        .header("Accept", "text/html,text/plain;q=0.9,*/*;q=0.5")
        .call()
        .map_err(|e| ExtractError::Fetch(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ExtractError::Fetch(format!("HTTP {status} for {url}")));
    }

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("text/plain")
        .to_ascii_lowercase();

    let body = response
        .into_body()
        .read_to_string()
        .map_err(|e| ExtractError::Fetch(e.to_string()))?;

    tracing::debug!(%url, content_type = %content_type, bytes = body.len(), "page fetched");
    Ok(body_to_text(&body, &content_type))
}

fn validate_url(raw: &str) -> Result<url::Url, ExtractError> {
    let url = url::Url::parse(raw.trim())
        .map_err(|e| ExtractError::Fetch(format!("invalid URL {raw:?}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ExtractError::Fetch(format!(
            "unsupported URL scheme {other:?}; use http or https"
        ))),
    }
}

fn body_to_text(body: &str, content_type: &str) -> String {
    if content_type.contains("html") {
        html2text::from_read(body.as_bytes(), FETCH_RENDER_WIDTH)
    } else {
        body.to_string()
    }
}
