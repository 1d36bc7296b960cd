//! Ollama Local Chat
//!
//! Local process, no auth. Generation parameters travel in `options` and the
//! reply is a `message.content` envelope.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{ChatMessage, CompletionRequest};
use crate::types::{RepodocError, Result};

pub(super) const DEFAULT_API_BASE: &str = "http://127.0.0.1:11434";
pub(super) const CHAT_PATH: &str = "/api/chat";

/// Validate endpoint URL for security (SSRF prevention)
///
/// Only allows http/https schemes and warns for non-localhost endpoints.
pub(super) fn validate_endpoint(endpoint: &str) -> Result<String> {
    let url = url::Url::parse(endpoint).map_err(|e| {
        RepodocError::Config(format!("Invalid Ollama endpoint URL '{}': {}", endpoint, e))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(RepodocError::Config(format!(
            "Ollama endpoint must use http or https scheme, got: {}",
            url.scheme()
        )));
    }

    if let Some(host) = url.host_str()
        && !matches!(host, "localhost" | "127.0.0.1" | "[::1]")
    {
        warn!(
            "Ollama endpoint is not localhost: {}. Ensure this is intentional.",
            host
        );
    }

    let mut result = url.to_string();
    if result.ends_with('/') {
        result.pop();
    }
    Ok(result)
}

// Request/Response types

#[derive(Debug, Serialize)]
pub(super) struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
    num_predict: usize,
}

impl<'a> ChatRequest<'a> {
    pub(super) fn from_request(request: &'a CompletionRequest) -> Self {
        Self {
            model: &request.model,
            messages: &request.messages,
            stream: false,
            options: ChatOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// `message.content`
pub(super) fn extract_content(body: &str) -> Option<String> {
    let response: ChatResponse = serde_json::from_str(body).ok()?;
    response.message.and_then(|m| m.content)
}
