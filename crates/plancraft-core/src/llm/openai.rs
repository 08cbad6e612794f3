//! OpenAI-compatible chat completions client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::trait_def::{ContentRequest, LlmError, TextGenerator, truncate_body};

const PROVIDER: &str = "openai";

/// Default API root; override for Azure or self-hosted gateways.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Client for `POST {base_url}/chat/completions`.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiClient {
    pub fn new(http: reqwest::Client, api_key: Option<String>, base_url: Option<String>) -> Self {
        Self {
            http,
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned())
                .trim_end_matches('/')
                .to_owned(),
            temperature: 0.7,
            max_tokens: 2500,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

fn build_body<'a>(request: &ContentRequest<'a>, temperature: f32, max_tokens: u32) -> ChatRequest<'a> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = request.system_instruction {
        messages.push(ChatMessage {
            role: "system",
            content: system,
        });
    }
    messages.push(ChatMessage {
        role: "user",
        content: request.prompt,
    });
    ChatRequest {
        model: request.model_id,
        messages,
        temperature,
        max_tokens,
    }
}

/// Pull the first choice's text out of a chat completion body.
///
/// A choice with `null` content yields an empty string.
fn parse_completion(body: &str) -> Result<String, LlmError> {
    let response: ChatResponse = serde_json::from_str(body).map_err(|e| LlmError::Decode {
        provider: PROVIDER.to_owned(),
        message: e.to_string(),
    })?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::Decode {
            provider: PROVIDER.to_owned(),
            message: "response contained no choices".to_owned(),
        })?;

    Ok(choice.message.content.unwrap_or_default())
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn generate_content(&self, request: &ContentRequest<'_>) -> Result<String, LlmError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| LlmError::MissingApiKey {
            provider: PROVIDER.to_owned(),
        })?;

        let body = build_body(request, self.temperature, self.max_tokens);
        debug!(model = request.model_id, url = %self.endpoint(), "sending chat completion request");

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(api_key)
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

        parse_completion(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request<'a>(system: Option<&'a str>) -> ContentRequest<'a> {
        ContentRequest {
            model_id: "gpt-3.5-turbo",
            system_instruction: system,
            prompt: "Plan my week",
        }
    }

    #[test]
    fn body_puts_system_message_first() {
        let body = build_body(&request(Some("You are a planner.")), 0.7, 2500);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-3.5-turbo");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], "You are a planner.");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "Plan my week");
        assert_eq!(json["max_tokens"], 2500);
    }

    #[test]
    fn body_without_system_has_single_message() {
        let body = build_body(&request(None), 0.7, 100);
        assert_eq!(body.messages.len(), 1);
        assert_eq!(body.messages[0].role, "user");
    }

    #[test]
    fn parse_first_choice_content() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"{\"title\":\"t\"}"}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), r#"{"title":"t"}"#);
    }

    #[test]
    fn parse_null_content_is_empty() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "");
    }

    #[test]
    fn parse_without_choices_is_decode_error() {
        let err = parse_completion(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, LlmError::Decode { .. }));
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_any_request() {
        let client = OpenAiClient::new(reqwest::Client::new(), None, None);
        let err = client.generate_content(&request(None)).await.unwrap_err();
        assert!(matches!(err, LlmError::MissingApiKey { .. }));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = OpenAiClient::new(
            reqwest::Client::new(),
            None,
            Some("http://localhost:8080/v1/".to_owned()),
        );
        assert_eq!(client.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[tokio::test]
    async fn error_status_carries_code_and_body() {
        let base = crate::llm::test_server::respond_once("503 Service Unavailable", "overloaded").await;
        let client = OpenAiClient::new(crate::llm::test_server::direct_client(), Some("k".to_owned()), Some(base));

        let err = client.generate_content(&request(None)).await.unwrap_err();
        match err {
            LlmError::Status { provider, status, body } => {
                assert_eq!(provider, "openai");
                assert_eq!(status, 503);
                assert_eq!(body, "overloaded");
            }
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn success_status_is_parsed() {
        let base = crate::llm::test_server::respond_once(
            "200 OK",
            r#"{"choices":[{"message":{"role":"assistant","content":"404"}}]}"#,
        )
        .await;
        let client = OpenAiClient::new(crate::llm::test_server::direct_client(), Some("k".to_owned()), Some(base));

        assert_eq!(client.generate_content(&request(None)).await.unwrap(), "404");
    }

    #[tokio::test]
    async fn unreachable_service_is_transport_error() {
        let base = crate::llm::test_server::refused_base_url().await;
        let client = OpenAiClient::new(crate::llm::test_server::direct_client(), Some("k".to_owned()), Some(base));

        let err = client.generate_content(&request(None)).await.unwrap_err();
        assert!(matches!(err, LlmError::Transport { .. }), "got {err:?}");
    }
}
