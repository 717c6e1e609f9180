//! Groq-backed `Reasoner`: OpenAI-compatible chat completions over HTTP.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LlmError;
use crate::llm::{Reasoner, prompts};
use crate::pipeline::types::{CandidateRecord, Classification};

const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Max tokens for the classification call (kept tight, it runs on every document).
const CLASSIFY_MAX_TOKENS: u32 = 512;

/// Max tokens for the structured extraction call.
const EXTRACT_MAX_TOKENS: u32 = 1024;

/// Temperature for both calls (deterministic parsing).
const TEMPERATURE: f32 = 0.0;

/// Reasoning collaborator backed by Groq's chat-completions endpoint.
pub struct GroqReasoner {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl GroqReasoner {
    pub fn new(client: reqwest::Client, api_key: SecretString, model: impl Into<String>) -> Self {
        Self {
            client,
            api_key,
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point at a different OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// One chat-completion round trip, returning the assistant text.
    async fn complete(
        &self,
        system: String,
        user: String,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed(format!(
                "HTTP {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| LlmError::InvalidResponse("empty completion".into()))?;

        debug!(model = %self.model, chars = content.len(), "LLM completion received");
        Ok(content)
    }
}

#[async_trait]
impl Reasoner for GroqReasoner {
    async fn classify(&self, document: &str, context: &str) -> Result<Classification, LlmError> {
        let raw = self
            .complete(
                prompts::build_classify_system_prompt(),
                prompts::build_classify_user_prompt(document, context),
                CLASSIFY_MAX_TOKENS,
            )
            .await?;
        prompts::parse_classify_response(&raw)
    }

    async fn extract_candidate(
        &self,
        document: &str,
        context: &str,
    ) -> Result<CandidateRecord, LlmError> {
        let raw = self
            .complete(
                prompts::build_extract_system_prompt(),
                prompts::build_extract_user_prompt(document, context),
                EXTRACT_MAX_TOKENS,
            )
            .await?;
        prompts::parse_extract_response(&raw)
    }
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_serializes_openai_shape() {
        let request = ChatRequest {
            model: "llama-3.1-8b-instant",
            messages: vec![ChatMessage {
                role: "user",
                content: "hello".into(),
            }],
            temperature: 0.0,
            max_tokens: 512,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "llama-3.1-8b-instant");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 512);
    }

    #[test]
    fn chat_response_deserializes() {
        let raw = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"{\"is_resume\":true}"},"finish_reason":"stop"}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content, "{\"is_resume\":true}");
    }

    #[test]
    fn chat_response_tolerates_missing_choices() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"id":"x"}"#).unwrap();
        assert!(parsed.choices.is_empty());
    }
}
