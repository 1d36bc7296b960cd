//! Completion Provider Abstraction
//!
//! A closed set of provider variants. Each variant owns its endpoint, its
//! auth convention, its request payload shape and its response envelope;
//! the completion client dispatches on the variant with a single `match`.
//!
//! ## Modules
//!
//! - `openai`: OpenAI-compatible chat completions (OpenAI, OpenRouter, Groq)
//! - `ollama`: local chat endpoint, no auth, `message.content` envelope
//! - `transport`: HTTP seam used by the client (reqwest in production)

mod ollama;
mod openai;
mod transport;

pub use transport::{ChatTransport, HttpReply, ReqwestTransport};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::constants::completion;
use crate::types::{RepodocError, Result};

// =============================================================================
// Messages
// =============================================================================

/// One role/content pair in a chat conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Provider-independent completion request
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: usize,
    pub messages: Vec<ChatMessage>,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            temperature: completion::DEFAULT_TEMPERATURE,
            max_tokens: completion::DEFAULT_MAX_TOKENS,
            messages,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Total characters across all messages
    pub fn input_chars(&self) -> usize {
        self.messages.iter().map(|m| m.content.chars().count()).sum()
    }
}

// =============================================================================
// Provider Variants
// =============================================================================

/// Supported completion providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "openrouter")]
    OpenRouter,
    Groq,
    Ollama,
}

impl Provider {
    pub const ALL: [Provider; 4] = [
        Provider::OpenAi,
        Provider::OpenRouter,
        Provider::Groq,
        Provider::Ollama,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::OpenRouter => "openrouter",
            Provider::Groq => "groq",
            Provider::Ollama => "ollama",
        }
    }

    /// Base URL used when no override is configured
    pub fn default_api_base(&self) -> &'static str {
        match self {
            Provider::OpenAi => openai::OPENAI_API_BASE,
            Provider::OpenRouter => openai::OPENROUTER_API_BASE,
            Provider::Groq => openai::GROQ_API_BASE,
            Provider::Ollama => ollama::DEFAULT_API_BASE,
        }
    }

    /// Full chat endpoint, optionally rooted at a custom base URL
    pub fn endpoint(&self, api_base: Option<&str>) -> Result<String> {
        match self {
            Provider::Ollama => {
                let base = ollama::validate_endpoint(api_base.unwrap_or(ollama::DEFAULT_API_BASE))?;
                Ok(format!("{}{}", base, ollama::CHAT_PATH))
            }
            _ => {
                let base = api_base.unwrap_or(self.default_api_base());
                Ok(format!("{}{}", base.trim_end_matches('/'), openai::CHAT_PATH))
            }
        }
    }

    /// The local variant runs on the operator's machine
    pub fn is_local(&self) -> bool {
        matches!(self, Provider::Ollama)
    }

    /// Whether a bearer credential must be sent
    pub fn requires_auth(&self) -> bool {
        !self.is_local()
    }

    /// Model used when none is configured
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Ollama => completion::DEFAULT_LOCAL_MODEL,
            _ => completion::DEFAULT_MODEL,
        }
    }

    /// Serialize a request in this provider's payload shape
    pub fn build_body(&self, request: &CompletionRequest) -> Result<Value> {
        let body = match self {
            Provider::Ollama => serde_json::to_value(ollama::ChatRequest::from_request(request))?,
            _ => serde_json::to_value(openai::ChatCompletionRequest::from_request(request))?,
        };
        Ok(body)
    }

    /// Pull generated text out of this provider's response envelope.
    ///
    /// `None` when the body does not parse or carries no non-empty text.
    pub fn extract_content(&self, body: &str) -> Option<String> {
        let content = match self {
            Provider::Ollama => ollama::extract_content(body),
            _ => openai::extract_content(body),
        };
        content.filter(|c| !c.is_empty())
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Provider {
    type Err = RepodocError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "openrouter" => Ok(Provider::OpenRouter),
            "groq" => Ok(Provider::Groq),
            "ollama" => Ok(Provider::Ollama),
            _ => Err(RepodocError::UnknownProvider(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CompletionRequest {
        CompletionRequest::new(
            "m",
            vec![ChatMessage::system("sys"), ChatMessage::user("hello")],
        )
        .with_max_tokens(256)
    }

    #[test]
    fn test_parse_provider() {
        assert_eq!("openai".parse::<Provider>().unwrap(), Provider::OpenAi);
        assert_eq!("OpenRouter".parse::<Provider>().unwrap(), Provider::OpenRouter);
        assert_eq!("groq".parse::<Provider>().unwrap(), Provider::Groq);
        assert_eq!("ollama".parse::<Provider>().unwrap(), Provider::Ollama);
        assert!(matches!(
            "anthropic".parse::<Provider>(),
            Err(RepodocError::UnknownProvider(name)) if name == "anthropic"
        ));
    }

    #[test]
    fn test_default_endpoints() {
        assert_eq!(
            Provider::OpenAi.endpoint(None).unwrap(),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            Provider::OpenRouter.endpoint(None).unwrap(),
            "https://openrouter.ai/api/v1/chat/completions"
        );
        assert_eq!(
            Provider::Groq.endpoint(None).unwrap(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
        assert_eq!(
            Provider::Ollama.endpoint(None).unwrap(),
            "http://127.0.0.1:11434/api/chat"
        );
    }

    #[test]
    fn test_endpoint_override() {
        assert_eq!(
            Provider::OpenAi.endpoint(Some("http://proxy.local/v1/")).unwrap(),
            "http://proxy.local/v1/chat/completions"
        );
        assert_eq!(
            Provider::Ollama.endpoint(Some("http://localhost:9999")).unwrap(),
            "http://localhost:9999/api/chat"
        );
        assert!(Provider::Ollama.endpoint(Some("ftp://localhost")).is_err());
    }

    #[test]
    fn test_auth_convention() {
        assert!(Provider::OpenAi.requires_auth());
        assert!(Provider::Groq.requires_auth());
        assert!(!Provider::Ollama.requires_auth());
        assert_eq!(Provider::Ollama.default_model(), "llama3.1");
    }

    #[test]
    fn test_hosted_body_shape() {
        let body = Provider::Groq.build_body(&request()).unwrap();
        assert_eq!(body["model"], "m");
        assert_eq!(body["max_tokens"], 256);
        assert_eq!(body["messages"][1]["content"], "hello");
        assert!(body.get("options").is_none());
    }

    #[test]
    fn test_local_body_shape() {
        let body = Provider::Ollama.build_body(&request()).unwrap();
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["num_predict"], 256);
        assert!(body.get("max_tokens").is_none());
        assert_eq!(body["messages"][0]["role"], "system");
    }

    #[test]
    fn test_extract_content_per_envelope() {
        let hosted = r#"{"choices":[{"message":{"content":"hi"}}]}"#;
        let local = r#"{"message":{"role":"assistant","content":"hey"}}"#;

        assert_eq!(Provider::OpenAi.extract_content(hosted).as_deref(), Some("hi"));
        assert_eq!(Provider::Ollama.extract_content(local).as_deref(), Some("hey"));
        assert_eq!(Provider::OpenAi.extract_content(local), None);
        assert_eq!(Provider::Ollama.extract_content(hosted), None);
        assert_eq!(
            Provider::OpenAi.extract_content(r#"{"choices":[{"message":{"content":""}}]}"#),
            None
        );
        assert_eq!(Provider::OpenAi.extract_content("<html>"), None);
    }
}
