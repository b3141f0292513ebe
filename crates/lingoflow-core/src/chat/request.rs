use serde_json::Value;

use crate::types::{ChatMessage, ChatRole};

/// Generation request sent to a provider
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub model: String,
    pub system_instruction: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub options: ChatOptions,
}

impl ChatRequest {
    /// Create a new chat request
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Set the system instruction
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// Add a message to the request
    pub fn with_message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }

    /// Add multiple messages
    pub fn with_messages(mut self, messages: impl IntoIterator<Item = ChatMessage>) -> Self {
        self.messages.extend(messages);
        self
    }

    /// Single user turn carrying `prompt`
    pub fn with_prompt(self, prompt: impl Into<String>) -> Self {
        self.with_message(ChatMessage::user(prompt))
    }

    /// Set options
    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    /// Enable streaming
    pub fn stream(mut self) -> Self {
        self.options.stream = true;
        self
    }

    /// Set temperature
    pub fn temperature(mut self, temp: f32) -> Self {
        self.options.temperature = Some(temp);
        self
    }

    /// Ask for structured JSON matching `schema`
    pub fn json_schema(mut self, schema: Value) -> Self {
        self.options.response_format = Some(ResponseFormat::json_schema(schema));
        self
    }

    /// Text of the last user turn, if any
    pub fn last_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.text.as_str())
    }
}

/// Options for chat completion
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub stream: bool,
    pub response_format: Option<ResponseFormat>,
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set temperature (0.0 - 2.0)
    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }
}

/// Response format for structured outputs
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseFormat {
    /// Plain text
    Text,
    /// JSON constrained by a schema
    JsonSchema { schema: Value },
}

impl ResponseFormat {
    pub fn json_schema(schema: Value) -> Self {
        Self::JsonSchema { schema }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Text => "text/plain",
            Self::JsonSchema { .. } => "application/json",
        }
    }
}
