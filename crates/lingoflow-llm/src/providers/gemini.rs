use async_trait::async_trait;
use lingoflow_core::chat::{ChatRequest, ChatResponse};

use crate::error::Result;
use crate::provider::{BaseProvider, LLMProvider, ProviderCapabilities, ProviderConfig, ProviderMetadata};
use crate::transformer::{GeminiTransformer, LLMStream};

/// Google Gemini provider
pub struct GeminiProvider {
    base: BaseProvider<GeminiTransformer>,
}

impl GeminiProvider {
    /// Create with the default endpoint and model
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(ProviderConfig::default().with_api_key(api_key))
    }

    /// Create with custom configuration
    pub fn with_config(config: ProviderConfig) -> Result<Self> {
        let metadata = ProviderMetadata {
            id: config.provider_id.clone(),
            name: "Google Gemini".to_string(),
            capabilities: ProviderCapabilities::all(),
        };
        let base = BaseProvider::new(config, GeminiTransformer::new(), metadata)?;
        Ok(Self { base })
    }

    pub fn config(&self) -> &ProviderConfig {
        self.base.config()
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    fn provider_id(&self) -> &str {
        self.base.provider_id()
    }

    fn metadata(&self) -> &ProviderMetadata {
        &self.base.metadata
    }

    fn default_model(&self) -> &str {
        &self.base.config().model
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.base.send_request(request).await
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<LLMStream> {
        self.base.send_stream_request(request).await
    }

    async fn validate(&self) -> Result<()> {
        LLMProvider::validate(&self.base).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::build_provider;
    use crate::LLMError;

    #[test]
    fn test_metadata() {
        let provider = GeminiProvider::new("key").unwrap();
        assert_eq!(provider.provider_id(), "gemini");
        assert!(provider.metadata().capabilities.json_schema);
        assert_eq!(provider.default_model(), "gemini-2.5-flash");
    }

    #[tokio::test]
    async fn test_validate_requires_credentials() {
        let provider = GeminiProvider::with_config(ProviderConfig::default()).unwrap();
        assert!(matches!(provider.validate().await, Err(LLMError::Auth(_))));
        assert!(GeminiProvider::new("key").unwrap().validate().await.is_ok());
    }

    #[test]
    fn test_unknown_provider() {
        let config = ProviderConfig::new("openai", "http://localhost");
        assert!(matches!(
            build_provider(config),
            Err(LLMError::ProviderNotFound(id)) if id == "openai"
        ));
    }
}
