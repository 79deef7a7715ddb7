//! OpenRouter chat-completions oracle adapter.
//!
//! Rate-limit responses (HTTP 429) back off exponentially, 2^attempt seconds,
//! up to three attempts; every other failure surfaces immediately. Clients
//! are explicit instances constructed at run start, never process singletons.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{OracleError, Result};
use crate::port::oracle::{ChatMessage, Oracle};

const RATE_LIMIT_ATTEMPTS: u32 = 3;

/// OpenRouter API client.
#[derive(Debug)]
pub struct OpenRouterOracle {
    http: HttpClient,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct Request<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<RequestMessage<'a>>,
}

#[derive(Serialize)]
struct RequestMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct Response {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

impl OpenRouterOracle {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http: HttpClient::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl Oracle for OpenRouterOracle {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = Request {
            model: &self.model,
            max_tokens,
            temperature,
            messages: messages
                .iter()
                .map(|m| RequestMessage {
                    role: m.role,
                    content: &m.content,
                })
                .collect(),
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            let response = self
                .http
                .post(&url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&request)
                .send()
                .await
                .map_err(OracleError::Http)?;

            if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
                if attempt >= RATE_LIMIT_ATTEMPTS {
                    return Err(OracleError::RateLimited { attempts: attempt }.into());
                }
                let wait = Duration::from_secs(1 << attempt);
                warn!(attempt, wait_secs = wait.as_secs(), "oracle rate limited, backing off");
                sleep(wait).await;
                continue;
            }

            if !response.status().is_success() {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                return Err(OracleError::Api { status, body }.into());
            }

            let parsed: Response = response.json().await.map_err(OracleError::Http)?;
            let content = parsed
                .choices
                .into_iter()
                .next()
                .map(|c| c.message.content)
                .ok_or(OracleError::EmptyCompletion)?;
            debug!(chars = content.len(), "oracle completion received");
            return Ok(content);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_chat_shape() {
        let request = Request {
            model: "some/model",
            max_tokens: 2048,
            temperature: 0.1,
            messages: vec![RequestMessage {
                role: "user",
                content: "List the implications.",
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "some/model");
        assert_eq!(json["max_tokens"], 2048);
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn response_takes_first_choice() {
        let response: Response = serde_json::from_str(
            r#"{
                "id": "gen-1",
                "choices": [
                    {"index": 0, "message": {"role": "assistant", "content": "first"}},
                    {"index": 1, "message": {"role": "assistant", "content": "second"}}
                ]
            }"#,
        )
        .unwrap();
        let content = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content);
        assert_eq!(content.as_deref(), Some("first"));
    }

    #[test]
    fn empty_choices_is_an_error() {
        let response: Response = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(response.choices.is_empty());
    }
}
