use std::fmt::Debug;

use async_trait::async_trait;

use super::{LlmRequest, LlmResponse};
use crate::domain::DomainError;

/// Chat completion backend (OpenAI-compatible, Anthropic)
#[async_trait]
pub trait LlmProvider: Send + Sync + Debug {
    /// Send a chat completion request
    async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::domain::llm::{FinishReason, Message};

    /// Provider that replays scripted replies and records every request
    #[derive(Debug)]
    pub struct MockLlmProvider {
        name: &'static str,
        script: Mutex<VecDeque<Result<String, String>>>,
        fallback: Option<Result<String, String>>,
        finish_reason: Option<FinishReason>,
        requests: Mutex<Vec<LlmRequest>>,
    }

    impl MockLlmProvider {
        pub fn new(name: &'static str) -> Self {
            Self {
                name,
                script: Mutex::new(VecDeque::new()),
                fallback: None,
                finish_reason: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Reply with this content to every call not covered by the script
        pub fn with_response(mut self, content: impl Into<String>) -> Self {
            self.fallback = Some(Ok(content.into()));
            self
        }

        /// Fail every call not covered by the script
        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.fallback = Some(Err(error.into()));
            self
        }

        /// Report this finish reason on every successful reply
        pub fn with_finish_reason(mut self, reason: FinishReason) -> Self {
            self.finish_reason = Some(reason);
            self
        }

        /// Queue a reply for the next unscripted call
        pub fn then_respond(self, content: impl Into<String>) -> Self {
            self.script.lock().unwrap().push_back(Ok(content.into()));
            self
        }

        /// Queue a failure for the next unscripted call
        pub fn then_fail(self, error: impl Into<String>) -> Self {
            self.script.lock().unwrap().push_back(Err(error.into()));
            self
        }

        pub fn call_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub fn requests(&self) -> Vec<LlmRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmProvider for MockLlmProvider {
        async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError> {
            self.requests.lock().unwrap().push(request);

            let next = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .or_else(|| self.fallback.clone())
                .unwrap_or_else(|| Err("No mock response configured".to_string()));

            match next {
                Ok(content) => {
                    let mut response = LlmResponse::new(
                        format!("mock-{}", self.call_count()),
                        model,
                        Message::assistant(content),
                    );
                    response.finish_reason = self.finish_reason.clone();
                    Ok(response)
                }
                Err(error) => Err(DomainError::provider(self.name, error)),
            }
        }

        fn provider_name(&self) -> &'static str {
            self.name
        }
    }
}
