// Azure OpenAI LlmClient Implementation

use async_openai::config::AzureConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use solace_core::domain::{ChatMessage, Role};
use solace_core::port::{CompletionRequest, LlmClient, LlmError};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_API_VERSION: &str = "2024-02-15-preview";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Connection settings; all three of endpoint, key and deployment are required
#[derive(Debug, Clone, Default)]
pub struct AzureOpenAiSettings {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub deployment: Option<String>,
    pub api_version: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl AzureOpenAiSettings {
    /// Names of the required settings that are missing or blank
    pub fn missing(&self) -> Vec<&'static str> {
        let blank = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());
        let mut missing = Vec::new();
        if blank(&self.endpoint) {
            missing.push("AZURE_OPENAI_ENDPOINT");
        }
        if blank(&self.api_key) {
            missing.push("AZURE_OPENAI_API_KEY");
        }
        if blank(&self.deployment) {
            missing.push("AZURE_OPENAI_DEPLOYMENT_NAME");
        }
        missing
    }
}

struct Configured {
    client: Client<AzureConfig>,
    deployment: String,
}

pub struct AzureOpenAiClient {
    inner: Option<Configured>,
    timeout: Duration,
}

impl AzureOpenAiClient {
    /// Build a client. Missing settings yield a client that reports
    /// `NotConfigured` on every call instead of failing startup.
    pub fn new(settings: AzureOpenAiSettings) -> Self {
        let timeout = Duration::from_secs(settings.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
        let missing = settings.missing();
        if !missing.is_empty() {
            warn!(missing = ?missing, "Azure OpenAI is not configured, chat replies will fall back");
            return Self {
                inner: None,
                timeout,
            };
        }

        let (Some(endpoint), Some(api_key), Some(deployment)) =
            (settings.endpoint, settings.api_key, settings.deployment)
        else {
            return Self {
                inner: None,
                timeout,
            };
        };

        let config = AzureConfig::new()
            .with_api_base(endpoint)
            .with_api_key(api_key)
            .with_deployment_id(deployment.clone())
            .with_api_version(
                settings
                    .api_version
                    .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            );

        Self {
            inner: Some(Configured {
                client: Client::with_config(config),
                deployment,
            }),
            timeout,
        }
    }
}

fn request_error(err: OpenAIError) -> LlmError {
    LlmError::Request(err.to_string())
}

/// Convert domain messages into provider request messages
pub(crate) fn to_request_messages(
    messages: &[ChatMessage],
) -> Result<Vec<ChatCompletionRequestMessage>, LlmError> {
    messages
        .iter()
        .map(|m| -> Result<ChatCompletionRequestMessage, OpenAIError> {
            Ok(match m.role {
                Role::System => ChatCompletionRequestSystemMessageArgs::default()
                    .content(m.content.as_str())
                    .build()?
                    .into(),
                Role::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(m.content.as_str())
                    .build()?
                    .into(),
                Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(m.content.as_str())
                    .build()?
                    .into(),
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(request_error)
}

#[async_trait]
impl LlmClient for AzureOpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let Some(inner) = &self.inner else {
            return Err(LlmError::NotConfigured);
        };

        let body = CreateChatCompletionRequestArgs::default()
            .model(inner.deployment.as_str())
            .max_tokens(request.max_tokens)
            .temperature(request.temperature)
            .messages(to_request_messages(&request.messages)?)
            .build()
            .map_err(request_error)?;

        debug!(
            messages = request.messages.len(),
            max_tokens = request.max_tokens,
            "Sending completion request"
        );

        let response = tokio::time::timeout(self.timeout, inner.client.chat().create(body))
            .await
            .map_err(|_| LlmError::Request(format!("timed out after {:?}", self.timeout)))?
            .map_err(request_error)?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(LlmError::EmptyResponse)?;

        let content = content.trim().to_string();
        if content.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(content)
    }

    fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}
