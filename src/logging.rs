//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

/// Bodies longer than this many characters are truncated in the `info` logs.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// JSON fields whose values are never written to the logs.
const REDACTED_FIELDS: [&str; 1] = ["password"];

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] characters, it is
/// truncated and the full body is logged at the `debug` level. Passwords in
/// JSON bodies are redacted and binary bodies are summarised by their size.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read the request body: {error}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let display_text = body_display_text(&parts.headers, &body_bytes);
    log_body("Received request", &parts, &display_text);

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read the response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let display_text = body_display_text(&parts.headers, &body_bytes);
    log_body("Sending response", &parts, &display_text);

    Response::from_parts(parts, Body::from(body_bytes))
}

/// The text to log for a body: redacted JSON, plain text, or a size summary
/// for anything else.
fn body_display_text(headers: &HeaderMap, body: &Bytes) -> String {
    if body.is_empty() {
        return String::new();
    }

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if content_type.starts_with("application/json") {
        redact_json(body)
    } else if content_type.is_empty() || content_type.starts_with("text/") {
        String::from_utf8_lossy(body).into_owned()
    } else {
        format!("<{} bytes of {content_type}>", body.len())
    }
}

/// Replace the values of [REDACTED_FIELDS] in a JSON object with asterisks.
///
/// Bodies that are not valid JSON are logged as a size summary instead, since
/// a malformed body could still hold a password.
fn redact_json(body: &[u8]) -> String {
    let Ok(mut value) = serde_json::from_slice::<Value>(body) else {
        return format!("<{} bytes of malformed JSON>", body.len());
    };

    if let Value::Object(fields) = &mut value {
        for field in REDACTED_FIELDS {
            if let Some(secret) = fields.get_mut(field) {
                *secret = Value::String("********".to_owned());
            }
        }
    }

    value.to_string()
}

fn log_body(label: &str, parts: &impl std::fmt::Debug, body: &str) {
    if body.chars().count() > LOG_BODY_LENGTH_LIMIT {
        let truncated: String = body.chars().take(LOG_BODY_LENGTH_LIMIT).collect();
        tracing::info!("{label}: {parts:#?}\nbody: {truncated}...");
        tracing::debug!("Full body: {body:?}");
    } else {
        tracing::info!("{label}: {parts:#?}\nbody: {body:?}");
    }
}
