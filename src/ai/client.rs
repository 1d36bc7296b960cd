//! Completion Client
//!
//! Sends one chat completion to the configured provider and drives the
//! retry/backoff state machine around it.
//!
//! ## States
//!
//! Every attempt ends in one of [`AttemptOutcome`]:
//! - **Success**: text extracted and returned (trimmed, outer code fence removed)
//! - **Retryable**: 429/5xx from a hosted provider, or a network failure
//! - **Fatal**: any other status, any status from the local provider, or a
//!   success whose envelope holds no text
//!
//! Status backoff is `1000 * 2^(attempt-1)` ms, raised to `Retry-After`, then
//! jittered by up to ±10%. Network failures use `800 * 2^(attempt-1)` ms with
//! no jitter. Both share one attempt counter.

use async_trait::async_trait;
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::provider::{ChatTransport, CompletionRequest, HttpReply, Provider, ReqwestTransport};
use super::tokenizer::estimate_tokens_from_chars;
use crate::config::LlmConfig;
use crate::constants::retry;
use crate::types::{AttemptOutcome, RepodocError, Result, StatusClassifier};

/// Longest slice of an error body kept in an error message
const MAX_ERROR_BODY_CHARS: usize = 500;

// =============================================================================
// Delay
// =============================================================================

/// Pluggable sleep, so backoff can be observed without real timers
#[async_trait]
pub trait Delay: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

// =============================================================================
// Backoff
// =============================================================================

/// Un-jittered delay after a retryable status on attempt `attempt` (1-based)
pub fn status_backoff(attempt: u32, retry_after: Option<Duration>) -> Duration {
    let base = exponential(retry::STATUS_BASE_DELAY_MS, attempt);
    match retry_after {
        Some(hint) if hint > base => hint,
        _ => base,
    }
}

/// Delay after a network failure on attempt `attempt` (1-based)
pub fn transport_backoff(attempt: u32) -> Duration {
    exponential(retry::TRANSPORT_BASE_DELAY_MS, attempt)
}

/// Perturb a delay by a uniform offset within ±10%
pub fn apply_jitter(delay: Duration) -> Duration {
    let millis = delay.as_millis() as i64;
    let span = (millis as f64 * retry::JITTER_RATIO).floor() as i64;
    if span == 0 {
        return delay;
    }
    let offset = rand::rng().random_range(-span..=span);
    Duration::from_millis((millis + offset).max(0) as u64)
}

fn exponential(base_ms: u64, attempt: u32) -> Duration {
    let factor = 1u64 << attempt.saturating_sub(1).min(20);
    Duration::from_millis(base_ms.saturating_mul(factor))
}

// =============================================================================
// Client
// =============================================================================

/// Provider-normalizing completion client with bounded retries
pub struct CompletionClient {
    provider: Provider,
    endpoint: String,
    credential: Option<SecretString>,
    max_retries: u32,
    transport: Arc<dyn ChatTransport>,
    delay: Arc<dyn Delay>,
}

impl std::fmt::Debug for CompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionClient")
            .field("provider", &self.provider)
            .field("endpoint", &self.endpoint)
            .field("credential", &self.credential.as_ref().map(|_| "[REDACTED]"))
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl CompletionClient {
    /// Create a client for `provider` at its default endpoint.
    ///
    /// Hosted providers require a non-empty credential; this is checked here,
    /// before any network call.
    pub fn new(
        provider: Provider,
        credential: Option<SecretString>,
        transport: Arc<dyn ChatTransport>,
    ) -> Result<Self> {
        let credential = credential.filter(|c| !c.expose_secret().trim().is_empty());
        if provider.requires_auth() && credential.is_none() {
            return Err(RepodocError::Config(format!(
                "Missing API key for provider '{}'. Set llm.api_key or REPODOC_LLM__API_KEY",
                provider
            )));
        }

        Ok(Self {
            endpoint: provider.endpoint(None)?,
            provider,
            credential: if provider.requires_auth() { credential } else { None },
            max_retries: retry::DEFAULT_MAX_RETRIES,
            transport,
            delay: Arc::new(TokioDelay),
        })
    }

    /// Build a reqwest-backed client from the `[llm]` config section
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let provider: Provider = config.provider.parse()?;
        let transport = Arc::new(ReqwestTransport::new(config.timeout_secs)?);
        let credential = config.api_key.clone().map(SecretString::from);

        let mut client = Self::new(provider, credential, transport)?
            .with_max_retries(config.max_retries);
        if let Some(base) = config.api_base.as_deref() {
            client = client.with_api_base(base)?;
        }
        Ok(client)
    }

    /// Root the provider endpoint at a custom base URL
    pub fn with_api_base(mut self, api_base: &str) -> Result<Self> {
        self.endpoint = self.provider.endpoint(Some(api_base))?;
        Ok(self)
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_delay(mut self, delay: Arc<dyn Delay>) -> Self {
        self.delay = delay;
        self
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send a completion and return the generated text
    pub async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = self.provider.build_body(request)?;

        info!(
            provider = %self.provider,
            model = %request.model,
            temperature = request.temperature,
            max_tokens = request.max_tokens,
            input_tokens = estimate_tokens_from_chars(request.input_chars()),
            "AI request"
        );

        let mut attempt: u32 = 0;
        let mut last_error: Option<RepodocError> = None;

        while attempt <= self.max_retries {
            let reply = self
                .transport
                .post_json(&self.endpoint, self.credential.as_ref(), &body)
                .await;

            let wait = match reply {
                Ok(reply) => match StatusClassifier::classify(reply.status, self.provider.is_local()) {
                    AttemptOutcome::Success => return self.accept(&reply),
                    AttemptOutcome::Fatal => return Err(self.api_error(&reply)),
                    AttemptOutcome::Retryable => {
                        attempt += 1;
                        let retry_after = reply
                            .retry_after
                            .as_deref()
                            .and_then(StatusClassifier::parse_retry_after);
                        last_error = Some(self.api_error(&reply));
                        if attempt > self.max_retries {
                            break;
                        }
                        let delay = apply_jitter(status_backoff(attempt, retry_after));
                        warn!(
                            status = reply.status,
                            attempt,
                            max_retries = self.max_retries,
                            delay_ms = delay.as_millis() as u64,
                            "AI request throttled, retrying"
                        );
                        delay
                    }
                },
                Err(err) => {
                    attempt += 1;
                    let message = err.to_string();
                    last_error = Some(err);
                    if attempt > self.max_retries {
                        break;
                    }
                    let delay = transport_backoff(attempt);
                    warn!(
                        error = %message,
                        attempt,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "AI request error, retrying"
                    );
                    delay
                }
            };

            self.delay.sleep(wait).await;
        }

        Err(RepodocError::ExhaustedRetries {
            attempts: attempt,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "AI request failed".to_string()),
        })
    }

    fn accept(&self, reply: &HttpReply) -> Result<String> {
        let content = self
            .provider
            .extract_content(&reply.body)
            .ok_or_else(|| RepodocError::NoContent {
                provider: self.provider.to_string(),
            })?;

        let chars = content.chars().count();
        info!(
            chars,
            approx_tokens = estimate_tokens_from_chars(chars),
            "AI response received"
        );

        Ok(clean_response(&content))
    }

    fn api_error(&self, reply: &HttpReply) -> RepodocError {
        debug!(status = reply.status, body = %reply.body, "AI request failed");
        RepodocError::Api {
            provider: self.provider.to_string(),
            status: reply.status,
            body: reply.body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        }
    }
}

/// Trim whitespace and drop a code fence that wraps the whole response
pub fn clean_response(text: &str) -> String {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("```")
        && let Some(inner) = rest.strip_suffix("```")
        && let Some(newline) = inner.find('\n')
    {
        return inner[newline + 1..].trim().to_string();
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::ChatMessage;
    use crate::ai::testing::{RecordingDelay, ScriptedTransport, Step, ok_reply};

    fn request() -> CompletionRequest {
        CompletionRequest::new("gpt-4o-mini", vec![ChatMessage::user("summarize")])
    }

    fn key() -> Option<SecretString> {
        Some(SecretString::from("sk-test".to_string()))
    }

    fn client(
        provider: Provider,
        transport: Arc<ScriptedTransport>,
        delay: Arc<RecordingDelay>,
        max_retries: u32,
    ) -> CompletionClient {
        CompletionClient::new(provider, key(), transport)
            .unwrap()
            .with_delay(delay)
            .with_max_retries(max_retries)
    }

    fn within_jitter(actual: Duration, base_ms: u64) -> bool {
        let ms = actual.as_millis() as u64;
        let span = base_ms / 10;
        ms >= base_ms - span && ms <= base_ms + span
    }

    #[test]
    fn test_backoff_schedules() {
        assert_eq!(status_backoff(1, None), Duration::from_millis(1000));
        assert_eq!(status_backoff(2, None), Duration::from_millis(2000));
        assert_eq!(status_backoff(3, None), Duration::from_millis(4000));
        assert_eq!(
            status_backoff(1, Some(Duration::from_secs(5))),
            Duration::from_secs(5)
        );
        // Hint never lowers the delay
        assert_eq!(
            status_backoff(3, Some(Duration::from_secs(1))),
            Duration::from_millis(4000)
        );
        assert_eq!(transport_backoff(1), Duration::from_millis(800));
        assert_eq!(transport_backoff(3), Duration::from_millis(3200));
    }

    #[test]
    fn test_jitter_bounds() {
        for _ in 0..200 {
            let d = apply_jitter(Duration::from_millis(1000));
            assert!(within_jitter(d, 1000), "{:?}", d);
        }
        assert_eq!(apply_jitter(Duration::from_millis(5)), Duration::from_millis(5));
    }

    #[test]
    fn test_clean_response() {
        assert_eq!(clean_response("  # Title\n\nBody \n"), "# Title\n\nBody");
        assert_eq!(clean_response("```markdown\n# Doc\ntext\n```"), "# Doc\ntext");
        assert_eq!(clean_response("```\nplain\n```\n"), "plain");
        assert_eq!(
            clean_response("Intro\n```rust\nfn x() {}\n```"),
            "Intro\n```rust\nfn x() {}\n```"
        );
    }

    #[test]
    fn test_missing_credential_fails_fast() {
        let transport = Arc::new(ScriptedTransport::always(ok_reply("x")));
        let result = CompletionClient::new(Provider::OpenAi, None, transport.clone());
        assert!(matches!(result, Err(RepodocError::Config(_))));

        let blank = Some(SecretString::from("  ".to_string()));
        assert!(CompletionClient::new(Provider::Groq, blank, transport.clone()).is_err());

        assert!(CompletionClient::new(Provider::Ollama, None, transport.clone()).is_ok());
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_retries_429_then_succeeds() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Step::Reply(HttpReply::new(429, "rate limited")),
            Step::Reply(HttpReply::new(429, "rate limited")),
            Step::Reply(ok_reply("  the summary  ")),
        ]));
        let delay = Arc::new(RecordingDelay::default());
        let client = client(Provider::OpenAi, transport.clone(), delay.clone(), 3);

        let text = client.complete(&request()).await.unwrap();

        assert_eq!(text, "the summary");
        assert_eq!(transport.calls(), 3);
        let delays = delay.recorded();
        assert_eq!(delays.len(), 2);
        assert!(within_jitter(delays[0], 1000));
        assert!(within_jitter(delays[1], 2000));
    }

    #[tokio::test]
    async fn test_persistent_500_exhausts_budget() {
        let transport = Arc::new(ScriptedTransport::always(HttpReply::new(500, "boom")));
        let delay = Arc::new(RecordingDelay::default());
        let client = client(Provider::OpenRouter, transport.clone(), delay.clone(), 2);

        let err = client.complete(&request()).await.unwrap_err();

        assert_eq!(transport.calls(), 3);
        assert_eq!(delay.recorded().len(), 2);
        match err {
            RepodocError::ExhaustedRetries {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("500"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_local_provider_never_retries() {
        let transport = Arc::new(ScriptedTransport::always(HttpReply::new(500, "oom")));
        let delay = Arc::new(RecordingDelay::default());
        let client = client(Provider::Ollama, transport.clone(), delay.clone(), 3);

        let err = client.complete(&request()).await.unwrap_err();

        assert!(matches!(err, RepodocError::Api { status: 500, .. }));
        assert_eq!(transport.calls(), 1);
        assert!(delay.recorded().is_empty());
        assert_eq!(transport.recorded()[0].bearer, None);
    }

    #[tokio::test]
    async fn test_non_retryable_status_is_fatal() {
        let transport = Arc::new(ScriptedTransport::always(HttpReply::new(401, "bad key")));
        let delay = Arc::new(RecordingDelay::default());
        let client = client(Provider::OpenAi, transport.clone(), delay.clone(), 3);

        let err = client.complete(&request()).await.unwrap_err();

        assert!(matches!(err, RepodocError::Api { status: 401, .. }));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_network_failures_use_transport_schedule() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Step::NetworkFailure("connection reset"),
            Step::NetworkFailure("connection reset"),
            Step::Reply(ok_reply("ok")),
        ]));
        let delay = Arc::new(RecordingDelay::default());
        let client = client(Provider::Groq, transport.clone(), delay.clone(), 3);

        assert_eq!(client.complete(&request()).await.unwrap(), "ok");
        assert_eq!(
            delay.recorded(),
            vec![Duration::from_millis(800), Duration::from_millis(1600)]
        );
    }

    #[tokio::test]
    async fn test_mixed_failures_share_budget() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Step::NetworkFailure("reset"),
            Step::Reply(HttpReply::new(503, "busy")),
            Step::NetworkFailure("reset"),
        ]));
        let delay = Arc::new(RecordingDelay::default());
        let client = client(Provider::OpenAi, transport.clone(), delay.clone(), 2);

        let err = client.complete(&request()).await.unwrap_err();

        assert!(matches!(err, RepodocError::ExhaustedRetries { attempts: 3, .. }));
        assert_eq!(transport.calls(), 3);
        let delays = delay.recorded();
        assert_eq!(delays[0], Duration::from_millis(800));
        assert!(within_jitter(delays[1], 2000));
    }

    #[tokio::test]
    async fn test_retry_after_raises_delay() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Step::Reply(HttpReply::new(429, "").with_retry_after("5")),
            Step::Reply(ok_reply("ok")),
        ]));
        let delay = Arc::new(RecordingDelay::default());
        let client = client(Provider::OpenAi, transport.clone(), delay.clone(), 3);

        client.complete(&request()).await.unwrap();
        assert!(within_jitter(delay.recorded()[0], 5000));
    }

    #[tokio::test]
    async fn test_empty_envelope_is_no_content() {
        let transport = Arc::new(ScriptedTransport::always(HttpReply::new(
            200,
            r#"{"choices":[]}"#,
        )));
        let delay = Arc::new(RecordingDelay::default());
        let client = client(Provider::OpenAi, transport.clone(), delay.clone(), 3);

        let err = client.complete(&request()).await.unwrap_err();

        assert!(matches!(err, RepodocError::NoContent { .. }));
        assert_eq!(transport.calls(), 1);
        assert!(delay.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_request_shape_and_auth() {
        let transport = Arc::new(ScriptedTransport::always(ok_reply("ok")));
        let client = CompletionClient::new(Provider::OpenAi, key(), transport.clone())
            .unwrap()
            .with_api_base("http://proxy.test/v1")
            .unwrap();

        client
            .complete(&request().with_max_tokens(256))
            .await
            .unwrap();

        let sent = &transport.recorded()[0];
        assert_eq!(sent.url, "http://proxy.test/v1/chat/completions");
        assert_eq!(sent.bearer.as_deref(), Some("sk-test"));
        assert_eq!(sent.body["max_tokens"], 256);
    }

    #[tokio::test]
    async fn test_zero_retries_single_attempt() {
        let transport = Arc::new(ScriptedTransport::always(HttpReply::new(429, "")));
        let delay = Arc::new(RecordingDelay::default());
        let client = client(Provider::OpenAi, transport.clone(), delay.clone(), 0);

        let err = client.complete(&request()).await.unwrap_err();
        assert!(matches!(err, RepodocError::ExhaustedRetries { attempts: 1, .. }));
        assert_eq!(transport.calls(), 1);
        assert!(delay.recorded().is_empty());
    }
}
