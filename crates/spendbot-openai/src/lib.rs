//! OpenAI-compatible adapter (expense extraction).
//!
//! Talks to any `/chat/completions` endpoint (Groq by default) and hands the completion
//! text to `spendbot_core::extraction` for parsing.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use spendbot_core::{
    config::Config,
    errors::Error,
    extraction::{self, ExpenseExtractor, ParsedExpenseIntent},
    Result,
};

#[derive(Clone, Debug)]
pub struct OpenAiExtractor {
    pub base_url: String,
    pub model: String,
    api_key: String,
    http: reqwest::Client,
}

impl OpenAiExtractor {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("http client build failed: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
            http,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(
            cfg.extraction_base_url.clone(),
            cfg.extraction_model.clone(),
            cfg.extraction_api_key.clone(),
            cfg.extraction_timeout,
        )
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn request_body<'a>(&'a self, message: &'a str) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: extraction::SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: message,
                },
            ],
            temperature: extraction::TEMPERATURE,
            max_tokens: extraction::MAX_TOKENS,
        }
    }

    /// Send one completion request and return the first choice's text.
    pub async fn complete(&self, message: &str) -> Result<String> {
        let resp = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&self.request_body(message))
            .send()
            .await
            .map_err(map_request_error)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Extraction(format!(
                "completion request failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let parsed: ChatCompletionResponse = resp
            .json()
            .await
            .map_err(|e| Error::Extraction(format!("completion json error: {e}")))?;

        first_choice_text(parsed)
    }
}

#[async_trait]
impl ExpenseExtractor for OpenAiExtractor {
    async fn extract(&self, message: &str) -> Result<ParsedExpenseIntent> {
        let text = self.complete(message).await?;
        debug!(model = %self.model, completion = %text, "extraction completion");
        extraction::parse_completion(&text)
    }
}

fn map_request_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        return Error::Extraction(format!("completion request timed out: {e}"));
    }
    Error::Extraction(format!("completion request error: {e}"))
}

fn first_choice_text(resp: ChatCompletionResponse) -> Result<String> {
    resp.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| Error::Extraction("completion returned no choices".to_string()))
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
