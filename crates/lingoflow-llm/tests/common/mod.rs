#![allow(dead_code)]

use async_trait::async_trait;
use futures::StreamExt;
use lingoflow_core::chat::{ChatChunk, ChatRequest, ChatResponse};
use lingoflow_llm::{LLMError, LLMProvider, LLMStream, ProviderCapabilities, ProviderMetadata};
use std::sync::Mutex;

/// What the mock stream does
pub enum Script {
    /// Yield the chunks and end
    Chunks(Vec<ChatChunk>),
    /// Fail before any chunk
    FailToOpen,
    /// Yield the chunks then a transport error
    BreakAfter(Vec<ChatChunk>),
    /// Yield the chunks then never finish
    Hang(Vec<ChatChunk>),
}

/// Mock LLM Provider for testing
pub struct MockLLMProvider {
    script: Mutex<Option<Script>>,
    response_text: String,
    requests: Mutex<Vec<ChatRequest>>,
    metadata: ProviderMetadata,
}

impl MockLLMProvider {
    pub fn new(script: Script) -> Self {
        Self::build(Some(script), String::new())
    }

    /// Stream that yields `fragments` in order
    pub fn with_fragments(fragments: &[&str]) -> Self {
        Self::new(Script::Chunks(
            fragments.iter().map(|f| ChatChunk::content(*f)).collect(),
        ))
    }

    /// Non-streaming reply carrying `text`
    pub fn with_response(text: impl Into<String>) -> Self {
        Self::build(None, text.into())
    }

    fn build(script: Option<Script>, response_text: String) -> Self {
        Self {
            script: Mutex::new(script),
            response_text,
            requests: Mutex::new(Vec::new()),
            metadata: ProviderMetadata {
                id: "mock".to_string(),
                name: "Mock Provider".to_string(),
                capabilities: ProviderCapabilities::all(),
            },
        }
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, request: ChatRequest) {
        self.requests.lock().unwrap().push(request);
    }
}

#[async_trait]
impl LLMProvider for MockLLMProvider {
    fn provider_id(&self) -> &str {
        "mock"
    }

    fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LLMError> {
        self.record(request);
        Ok(ChatResponse::new(self.response_text.clone()))
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<LLMStream, LLMError> {
        self.record(request);
        let script = self
            .script
            .lock()
            .unwrap()
            .take()
            .unwrap_or(Script::Chunks(Vec::new()));

        let stream: LLMStream = match script {
            Script::Chunks(chunks) => Box::pin(futures::stream::iter(chunks.into_iter().map(Ok))),
            Script::FailToOpen => return Err(LLMError::Network("connection refused".into())),
            Script::BreakAfter(chunks) => Box::pin(
                futures::stream::iter(chunks.into_iter().map(Ok)).chain(futures::stream::once(
                    async { Err(LLMError::Stream("connection reset".into())) },
                )),
            ),
            Script::Hang(chunks) => Box::pin(
                futures::stream::iter(chunks.into_iter().map(Ok))
                    .chain(futures::stream::pending()),
            ),
        };
        Ok(stream)
    }

    async fn validate(&self) -> Result<(), LLMError> {
        Ok(())
    }
}
