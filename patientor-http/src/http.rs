//! Shared HTTP response helpers.
//!
//! Centralizes status-code checks (404 to [`HttpError::NotFound`], any other
//! non-success to [`HttpError::Api`] carrying the body's `message` field) so
//! the client methods stay focused on request construction.

use serde_json::Value;

use crate::error::HttpError;

/// Check an HTTP response for error statuses, returning it unchanged on success.
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, HttpError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(HttpError::NotFound(resp.url().path().to_string()));
    }

    let body = resp.text().await.unwrap_or_default();
    let message = extract_message(&body);
    tracing::debug!(status = status.as_u16(), ?message, "API returned an error status");
    Err(HttpError::Api {
        status: status.as_u16(),
        message,
    })
}

/// The string `message` field of a JSON error body.
fn extract_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
}
