// LLM Completion Port

use crate::domain::ChatMessage;
use async_trait::async_trait;
use thiserror::Error;

/// A single chat-completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    /// System prompt followed by one user message
    pub fn prompt(
        system: impl Into<String>,
        user: impl Into<String>,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            max_tokens,
            temperature,
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum LlmError {
    #[error("LLM provider is not configured")]
    NotConfigured,

    #[error("LLM request failed: {0}")]
    Request(String),

    #[error("LLM returned no completion")]
    EmptyResponse,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Run a completion and return the assistant text
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;

    /// Whether credentials are present
    fn is_configured(&self) -> bool;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Scripted LLM: the first rule whose needle occurs in a system or user
    /// message wins, otherwise the default reply is used.
    pub struct ScriptedLlm {
        rules: Mutex<Vec<(String, Result<String, LlmError>)>>,
        default_reply: Mutex<Result<String, LlmError>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedLlm {
        pub fn new(default_reply: impl Into<String>) -> Self {
            Self {
                rules: Mutex::new(Vec::new()),
                default_reply: Mutex::new(Ok(default_reply.into())),
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Every call fails
        pub fn failing() -> Self {
            let llm = Self::new("");
            *llm.default_reply.lock().unwrap() =
                Err(LlmError::Request("scripted failure".to_string()));
            llm
        }

        pub fn reply_when(self, needle: impl Into<String>, reply: impl Into<String>) -> Self {
            self.rules
                .lock()
                .unwrap()
                .push((needle.into(), Ok(reply.into())));
            self
        }

        pub fn fail_when(self, needle: impl Into<String>) -> Self {
            self.rules.lock().unwrap().push((
                needle.into(),
                Err(LlmError::Request("scripted failure".to_string())),
            ));
            self
        }

        pub fn call_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
            let haystack: String = request
                .messages
                .iter()
                .filter(|m| m.role != crate::domain::Role::Assistant)
                .map(|m| m.content.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            self.requests.lock().unwrap().push(request);

            let rules = self.rules.lock().unwrap();
            for (needle, reply) in rules.iter() {
                if haystack.contains(needle.as_str()) {
                    return reply.clone();
                }
            }
            self.default_reply.lock().unwrap().clone()
        }

        fn is_configured(&self) -> bool {
            true
        }
    }
}
