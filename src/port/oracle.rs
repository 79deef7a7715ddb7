//! Reasoning-oracle port.
//!
//! A chat-completion backend used for relationship extraction. The port
//! returns raw completion text; all parsing tolerance lives in the caller.

use async_trait::async_trait;

use crate::error::Result;

/// One chat message in a completion request.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

/// Chat-completion oracle.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Run one completion and return the raw assistant text.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String>;
}

#[cfg(test)]
pub mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Mock oracle replaying canned completions in order.
    pub struct MockOracle {
        responses: Mutex<VecDeque<Result<String>>>,
    }

    impl MockOracle {
        pub fn new(responses: Vec<Result<String>>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().collect()),
            }
        }

        pub fn replying(text: impl Into<String>) -> Self {
            Self::new(vec![Ok(text.into())])
        }
    }

    #[async_trait]
    impl Oracle for MockOracle {
        async fn complete(
            &self,
            _messages: &[ChatMessage],
            _temperature: f32,
            _max_tokens: u32,
        ) -> Result<String> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }
}
