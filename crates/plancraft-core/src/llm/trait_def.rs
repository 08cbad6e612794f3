//! The `TextGenerator` trait -- the adapter interface for generation services.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from talking to a generation service.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("no API key configured for {provider}")]
    MissingApiKey { provider: String },

    #[error("request to {provider} failed: {source}")]
    Transport {
        provider: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} returned HTTP {status}: {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("could not decode {provider} response: {message}")]
    Decode { provider: String, message: String },

    #[error("generation timed out after {after:?}")]
    Timeout { after: Duration },
}

/// One completion request.
#[derive(Debug, Clone, Copy)]
pub struct ContentRequest<'a> {
    /// Provider-specific model identifier (e.g. `gpt-3.5-turbo`).
    pub model_id: &'a str,
    /// Role line sent ahead of the prompt, when the provider supports one.
    pub system_instruction: Option<&'a str>,
    /// The user prompt.
    pub prompt: &'a str,
}

/// A hosted text-generation capability: prompt in, text out.
///
/// Implementations make exactly one request per call and never retry.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short provider name used in logs and errors.
    fn name(&self) -> &str;

    /// Send `request` and return the completion text.
    ///
    /// An empty string is a valid reply (for example a safety block); it is
    /// the caller's job to interpret it.
    async fn generate_content(&self, request: &ContentRequest<'_>) -> Result<String, LlmError>;
}

// Compile-time assertion: TextGenerator must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn TextGenerator) {}
};

/// Cut an error body down to something that fits in a log line.
pub(crate) fn truncate_body(body: &str, max_chars: usize) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_owned(),
    }
}
