use async_trait::async_trait;
use lingoflow_core::chat::{ChatRequest, ChatResponse};

use crate::error::Result;
use crate::transformer::LLMStream;

/// LLM Provider trait
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Get the provider ID
    fn provider_id(&self) -> &str;

    /// Get provider metadata
    fn metadata(&self) -> &ProviderMetadata;

    /// Default model for requests that do not name one
    fn default_model(&self) -> &str;

    /// Send a chat request and get a complete response
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Send a chat request and stream the response
    async fn chat_stream(&self, request: ChatRequest) -> Result<LLMStream>;

    /// Validate the provider configuration
    async fn validate(&self) -> Result<()>;
}

/// Provider metadata
#[derive(Debug, Clone)]
pub struct ProviderMetadata {
    /// Provider ID
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Provider capabilities
    pub capabilities: ProviderCapabilities,
}

/// Provider capabilities
#[derive(Debug, Clone)]
pub struct ProviderCapabilities {
    /// Supports streaming responses
    pub streaming: bool,
    /// Supports JSON output constrained by a schema
    pub json_schema: bool,
    /// Accepts a separate system instruction
    pub system_instruction: bool,
}

impl ProviderCapabilities {
    /// Enable all capabilities
    pub fn all() -> Self {
        Self {
            streaming: true,
            json_schema: true,
            system_instruction: true,
        }
    }
}

impl Default for ProviderCapabilities {
    fn default() -> Self {
        Self {
            streaming: true,
            json_schema: false,
            system_instruction: false,
        }
    }
}
