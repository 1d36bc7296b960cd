//! Completion HTTP transport
//!
//! The completion client never touches reqwest directly. It hands a URL, an
//! optional bearer credential and a JSON body to a [`ChatTransport`] and gets
//! back the raw status, the `Retry-After` header and the body text. Tests swap
//! in scripted transports.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::constants::network;
use crate::types::{RepodocError, Result};

/// Raw reply from a completion endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    /// Raw `Retry-After` header value, if any
    pub retry_after: Option<String>,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            retry_after: None,
            body: body.into(),
        }
    }

    pub fn with_retry_after(mut self, value: impl Into<String>) -> Self {
        self.retry_after = Some(value.into());
        self
    }
}

/// POST seam for completion calls.
///
/// Implementations return `Err(RepodocError::Transport)` only for network
/// failures; every HTTP status, including errors, is an `Ok(HttpReply)`.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn post_json(
        &self,
        url: &str,
        bearer: Option<&SecretString>,
        body: &Value,
    ) -> Result<HttpReply>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(network::CONNECTION_TIMEOUT_SECS))
            .user_agent(network::USER_AGENT)
            .build()
            .map_err(|e| RepodocError::Http(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChatTransport for ReqwestTransport {
    async fn post_json(
        &self,
        url: &str,
        bearer: Option<&SecretString>,
        body: &Value,
    ) -> Result<HttpReply> {
        let mut request = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(body);

        if let Some(token) = bearer {
            request = request.header(
                "Authorization",
                format!("Bearer {}", token.expose_secret()),
            );
        }

        let response = request.send().await.map_err(|e| {
            if e.is_connect() {
                RepodocError::Transport(format!("Failed to connect to {}: {}", url, e))
            } else {
                RepodocError::Transport(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .text()
            .await
            .map_err(|e| RepodocError::Transport(format!("Failed to read response body: {}", e)))?;

        debug!(status, bytes = body.len(), "Completion endpoint replied");

        Ok(HttpReply {
            status,
            retry_after,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_posts_json_with_bearer() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(serde_json::json!({"model": "m"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"content":"ok"}}]}"#)
            .create_async()
            .await;

        let transport = ReqwestTransport::new(10).unwrap();
        let token = SecretString::from("sk-test".to_string());
        let reply = transport
            .post_json(
                &format!("{}/v1/chat/completions", server.url()),
                Some(&token),
                &serde_json::json!({"model": "m"}),
            )
            .await
            .unwrap();

        assert_eq!(reply.status, 200);
        assert!(reply.body.contains("ok"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_is_a_reply() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/chat")
            .match_header("authorization", Matcher::Missing)
            .with_status(429)
            .with_header("retry-after", "3")
            .with_body("slow down")
            .create_async()
            .await;

        let transport = ReqwestTransport::new(10).unwrap();
        let reply = transport
            .post_json(
                &format!("{}/api/chat", server.url()),
                None,
                &serde_json::json!({}),
            )
            .await
            .unwrap();

        assert_eq!(reply.status, 429);
        assert_eq!(reply.retry_after.as_deref(), Some("3"));
        assert_eq!(reply.body, "slow down");
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport_error() {
        let transport = ReqwestTransport::new(2).unwrap();
        let result = transport
            .post_json("http://127.0.0.1:1/chat", None, &serde_json::json!({}))
            .await;
        assert!(matches!(result, Err(RepodocError::Transport(_))));
    }
}
