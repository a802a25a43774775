use crate::adapters::oauth::OAuth1Signer;
use crate::domain::ports::Publisher;
use crate::utils::error::{BotError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Twitter API v2 client posting on behalf of the OAuth 1.0a user.
pub struct TwitterClient {
    client: Client,
    signer: OAuth1Signer,
    base_url: String,
}

#[derive(Serialize)]
struct TweetRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply: Option<ReplySettings<'a>>,
}

#[derive(Serialize)]
struct ReplySettings<'a> {
    in_reply_to_tweet_id: &'a str,
}

#[derive(Deserialize)]
struct TweetResponse {
    data: TweetData,
}

#[derive(Deserialize)]
struct TweetData {
    id: String,
}

impl TwitterClient {
    pub fn new(signer: OAuth1Signer, base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            signer,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Publisher for TwitterClient {
    async fn post_tweet(&self, text: &str, reply_to: Option<&str>) -> Result<Option<String>> {
        let url = format!("{}/tweets", self.base_url);
        let payload = TweetRequest {
            text,
            reply: reply_to.map(|id| ReplySettings {
                in_reply_to_tweet_id: id,
            }),
        };
        let authorization = self.signer.authorization_header("POST", &url, &[])?;

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Error posting tweet: {}", e);
                BotError::from(e)
            })?;

        if response.status() != StatusCode::CREATED {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Failed to post tweet ({}): {}", status, body);
            return Ok(None);
        }

        let created: TweetResponse = response.json().await.map_err(|e| BotError::ApiResponseError {
            service: "twitter".to_string(),
            message: format!("tweet created but response unreadable: {}", e),
        })?;
        tracing::info!("Successfully posted tweet {}: {}", created.data.id, text);
        Ok(Some(created.data.id))
    }
}

/// Publisher for dry runs: logs instead of posting and hands out placeholder ids.
#[derive(Debug, Default)]
pub struct LogPublisher {
    counter: std::sync::atomic::AtomicUsize,
}

#[async_trait]
impl Publisher for LogPublisher {
    async fn post_tweet(&self, text: &str, reply_to: Option<&str>) -> Result<Option<String>> {
        let n = self
            .counter
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed)
            + 1;
        match reply_to {
            Some(parent) => tracing::info!("[dry run] reply to {}:\n{}", parent, text),
            None => tracing::info!("[dry run] tweet:\n{}", text),
        }
        Ok(Some(format!("dry-run-{}", n)))
    }
}
