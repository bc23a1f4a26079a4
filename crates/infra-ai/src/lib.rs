// Solace Infrastructure - External AI and video services
// Implements: LlmClient (Azure OpenAI), VideoSearch (YouTube Data API v3)

mod azure_openai;
mod youtube;

pub use azure_openai::{AzureOpenAiClient, AzureOpenAiSettings, DEFAULT_API_VERSION};
pub use youtube::YouTubeClient;
