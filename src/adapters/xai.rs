//! Client for the xAI chat completions API.

use crate::config::{RetryPolicy, XaiConfig};
use crate::domain::model::ChatMessage;
use crate::domain::ports::ChatClient;
use crate::utils::error::{BotError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

pub struct XaiChat {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [ChatMessage],
    model: &'a str,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl XaiChat {
    pub fn new(api_key: impl Into<String>, config: &XaiConfig, retry: RetryPolicy) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(BotError::MissingCredentialsError {
                missing: vec![crate::config::credentials::XAI_API_KEY.to_string()],
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            retry,
        })
    }

    async fn chat_once(&self, messages: &[ChatMessage]) -> Result<Option<String>> {
        let request = ChatRequest {
            messages,
            model: &self.model,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::ApiStatusError {
                service: "xai".to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());

        if content.is_none() {
            warn!("xAI response carried no message content");
        }
        Ok(content)
    }
}

#[async_trait]
impl ChatClient for XaiChat {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<Option<String>> {
        let attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.chat_once(messages).await {
                Ok(content) => return Ok(content),
                Err(e) if attempt < attempts => {
                    let delay = self.retry.delay_after(attempt);
                    warn!(attempt, error = %e, "Chat request failed, retrying in {:?}", delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!("Error in chat request after {} attempts: {}", attempt, e);
                    return Err(e);
                }
            }
        }
    }
}

impl std::fmt::Debug for XaiChat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XaiChat")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}
