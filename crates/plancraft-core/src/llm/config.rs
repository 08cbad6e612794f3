//! Generation service configuration.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::gemini::GeminiClient;
use super::openai::OpenAiClient;
use super::trait_def::{LlmError, TextGenerator};

/// Which hosted service to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    #[serde(rename = "openai")]
    OpenAi,
    Gemini,
}

impl LlmProvider {
    /// Model used when none is configured.
    pub fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-3.5-turbo",
            Self::Gemini => "gemini-1.5-flash",
        }
    }

    /// Provider-specific environment variable holding the API key.
    pub fn api_key_env_var(self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Gemini => "GEMINI_API_KEY",
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
        };
        f.write_str(s)
    }
}

impl FromStr for LlmProvider {
    type Err = LlmProviderParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "gemini" => Ok(Self::Gemini),
            _ => Err(LlmProviderParseError(s.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`LlmProvider`] string.
#[derive(Debug, Clone)]
pub struct LlmProviderParseError(pub String);

impl fmt::Display for LlmProviderParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid LLM provider: {:?} (expected openai or gemini)", self.0)
    }
}

impl std::error::Error for LlmProviderParseError {}

/// Fully resolved settings for building a [`TextGenerator`].
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    /// `None` is allowed; calls then fail with [`LlmError::MissingApiKey`].
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: Option<String>,
    pub timeout: Duration,
}

impl LlmConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new(provider: LlmProvider) -> Self {
        Self {
            provider,
            api_key: None,
            model: provider.default_model().to_owned(),
            base_url: None,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Build the HTTP client for the configured provider.
    ///
    /// The HTTP-level timeout matches [`LlmConfig::timeout`].
    pub fn build_client(&self) -> Result<Arc<dyn TextGenerator>, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|source| LlmError::Transport {
                provider: self.provider.to_string(),
                source,
            })?;

        let client: Arc<dyn TextGenerator> = match self.provider {
            LlmProvider::OpenAi => Arc::new(OpenAiClient::new(
                http,
                self.api_key.clone(),
                self.base_url.clone(),
            )),
            LlmProvider::Gemini => Arc::new(GeminiClient::new(
                http,
                self.api_key.clone(),
                self.base_url.clone(),
            )),
        };
        Ok(client)
    }
}
