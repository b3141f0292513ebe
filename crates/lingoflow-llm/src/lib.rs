//! Gemini client plus the two LingoFlow features built on it: prep material
//! acquisition and the streaming interpreter assistant.

pub mod assistant;
pub mod auth;
pub mod error;
pub mod prep;
pub mod provider;
pub mod providers;
pub mod transformer;

pub use assistant::{Assistant, AssistantError, TurnOutcome, CONNECTION_LOST_REPLY};
pub use auth::{ApiKeyAuth, Authenticator, BearerAuth, NoAuth};
pub use error::{ConversionError, LLMError, Result};
pub use prep::{PrepError, PrepResult, PrepService, PREP_FAILURE_NOTICE};
pub use provider::{
    AuthConfig, BaseProvider, LLMProvider, ProviderCapabilities, ProviderConfig, ProviderMetadata,
};
pub use providers::{build_provider, GeminiProvider};
pub use transformer::{GeminiTransformer, LLMStream, SchemaTransformer};
