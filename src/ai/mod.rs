//! AI Integration Layer
//!
//! Token sizing, prompt construction and the retrying completion client.

pub mod client;
pub mod prompt;
pub mod provider;
pub mod tokenizer;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{CompletionClient, Delay, TokioDelay, clean_response};
pub use prompt::{PromptBuilder, PromptSection, PromptTemplates};
pub use provider::{
    ChatMessage, ChatTransport, CompletionRequest, HttpReply, Provider, ReqwestTransport,
};
pub use tokenizer::{
    BatchStats, batch_by_token_limit, effective_ceiling, estimate_tokens, split_oversized_files,
};
