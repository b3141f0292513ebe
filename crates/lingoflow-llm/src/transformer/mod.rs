pub mod gemini;
pub mod utils;

pub use gemini::GeminiTransformer;

use futures::Stream;
use lingoflow_core::chat::{ChatChunk, ChatRequest, ChatResponse};
use serde_json::Value;
use std::pin::Pin;

use crate::error::ConversionError;

/// Type alias for LLM stream
pub type LLMStream = Pin<Box<dyn Stream<Item = Result<ChatChunk, crate::LLMError>> + Send>>;

/// Schema transformer trait for converting between internal and provider formats
pub trait SchemaTransformer: Send + Sync {
    /// Get the provider ID
    fn provider_id(&self) -> &str;

    /// Full URL the request is posted to
    fn endpoint(&self, base_url: &str, request: &ChatRequest) -> String;

    /// Transform request to provider-specific format
    fn transform_request(&self, request: &ChatRequest) -> Result<Value, ConversionError>;

    /// Parse one server-sent event payload
    ///
    /// A single event may carry text, usage and a finish marker at once.
    fn parse_stream_chunk(&self, data: &str) -> Result<Vec<ChatChunk>, ConversionError>;

    /// Parse a complete response (non-streaming)
    fn parse_response(&self, data: &Value) -> Result<ChatResponse, ConversionError>;
}
