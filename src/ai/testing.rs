//! Scripted transport and recording delay for completion tests

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use super::client::Delay;
use super::provider::{ChatTransport, HttpReply};
use crate::types::{RepodocError, Result};

pub(crate) enum Step {
    Reply(HttpReply),
    NetworkFailure(&'static str),
}

/// Plays back a fixed script of replies, then repeats the fallback forever
pub(crate) struct ScriptedTransport {
    script: Mutex<VecDeque<Step>>,
    fallback: Option<HttpReply>,
    pub(crate) requests: Mutex<Vec<RecordedRequest>>,
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub url: String,
    pub bearer: Option<String>,
    pub body: Value,
}

impl ScriptedTransport {
    pub(crate) fn new(script: Vec<Step>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn always(reply: HttpReply) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(reply),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn recorded(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Hosted-provider success envelope carrying `content`
pub(crate) fn ok_reply(content: &str) -> HttpReply {
    HttpReply::new(
        200,
        serde_json::json!({"choices": [{"message": {"content": content}}]}).to_string(),
    )
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn post_json(
        &self,
        url: &str,
        bearer: Option<&SecretString>,
        body: &Value,
    ) -> Result<HttpReply> {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            bearer: bearer.map(|b| b.expose_secret().to_string()),
            body: body.clone(),
        });

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Step::Reply(reply)) => Ok(reply),
            Some(Step::NetworkFailure(reason)) => Err(RepodocError::Transport(reason.to_string())),
            None => match &self.fallback {
                Some(reply) => Ok(reply.clone()),
                None => Err(RepodocError::Transport("script exhausted".to_string())),
            },
        }
    }
}

/// Records requested sleeps instead of waiting
#[derive(Default)]
pub(crate) struct RecordingDelay {
    pub(crate) delays: Mutex<Vec<Duration>>,
}

impl RecordingDelay {
    pub(crate) fn recorded(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Delay for RecordingDelay {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}
