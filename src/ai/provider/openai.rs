//! OpenAI-compatible Chat Completions
//!
//! OpenAI, OpenRouter and Groq share one payload and one response envelope;
//! they differ only in base URL.

use serde::{Deserialize, Serialize};

use super::{ChatMessage, CompletionRequest};

pub(super) const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub(super) const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";
pub(super) const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";
pub(super) const CHAT_PATH: &str = "/chat/completions";

// Request/Response types

#[derive(Debug, Serialize)]
pub(super) struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: usize,
}

impl<'a> ChatCompletionRequest<'a> {
    pub(super) fn from_request(request: &'a CompletionRequest) -> Self {
        Self {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// `choices[0].message.content`
pub(super) fn extract_content(body: &str) -> Option<String> {
    let response: ChatCompletionResponse = serde_json::from_str(body).ok()?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
}
