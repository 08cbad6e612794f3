//! Google Gemini `generateContent` client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::trait_def::{ContentRequest, LlmError, TextGenerator, truncate_body};

const PROVIDER: &str = "gemini";

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Client for `POST {base_url}/models/{model}:generateContent`.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    temperature: f32,
    max_output_tokens: u32,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, api_key: Option<String>, base_url: Option<String>) -> Self {
        Self {
            http,
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned())
                .trim_end_matches('/')
                .to_owned(),
            temperature: 0.7,
            max_output_tokens: 2500,
        }
    }

    fn endpoint(&self, model_id: &str) -> String {
        format!("{}/models/{model_id}:generateContent", self.base_url)
    }
}

fn build_body<'a>(
    request: &ContentRequest<'a>,
    temperature: f32,
    max_output_tokens: u32,
) -> GenerateRequest<'a> {
    GenerateRequest {
        contents: vec![Content {
            role: Some("user"),
            parts: vec![Part {
                text: request.prompt,
            }],
        }],
        system_instruction: request.system_instruction.map(|text| Content {
            role: None,
            parts: vec![Part { text }],
        }),
        generation_config: GenerationConfig {
            temperature,
            max_output_tokens,
        },
    }
}

/// Concatenate the text parts of the first candidate.
///
/// A blocked prompt or a response without candidates yields an empty string.
fn parse_response(body: &str) -> Result<String, LlmError> {
    let response: GenerateResponse = serde_json::from_str(body).map_err(|e| LlmError::Decode {
        provider: PROVIDER.to_owned(),
        message: e.to_string(),
    })?;

    if let Some(reason) = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
    {
        warn!(reason = %reason, "gemini blocked the prompt");
        return Ok(String::new());
    }

    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default();

    Ok(text)
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn generate_content(&self, request: &ContentRequest<'_>) -> Result<String, LlmError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| LlmError::MissingApiKey {
            provider: PROVIDER.to_owned(),
        })?;

        let url = self.endpoint(request.model_id);
        let body = build_body(request, self.temperature, self.max_output_tokens);
        debug!(model = request.model_id, url = %url, "sending generateContent request");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|source| LlmError::Transport {
                provider: PROVIDER.to_owned(),
                source,
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|source| LlmError::Transport {
            provider: PROVIDER.to_owned(),
            source,
        })?;

        if !status.is_success() {
            return Err(LlmError::Status {
                provider: PROVIDER.to_owned(),
                status: status.as_u16(),
                body: truncate_body(&text, 500),
            });
        }

        parse_response(&text)
    }
}
