pub mod gemini;

pub use gemini::GeminiProvider;

use std::sync::Arc;

use crate::error::{LLMError, Result};
use crate::provider::{LLMProvider, ProviderConfig};

/// Build the provider named by `config.provider_id`
pub fn build_provider(config: ProviderConfig) -> Result<Arc<dyn LLMProvider>> {
    match config.provider_id.as_str() {
        "gemini" => Ok(Arc::new(GeminiProvider::with_config(config)?)),
        other => Err(LLMError::ProviderNotFound(other.to_string())),
    }
}
