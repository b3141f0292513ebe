/// Chat stream chunk
#[derive(Debug, Clone, PartialEq)]
pub enum ChatChunk {
    /// Text content delta
    Content { text: String },
    /// Usage information
    Usage { input_tokens: u32, output_tokens: u32 },
    /// Stream finished
    Finish { reason: FinishReason },
    /// Error reported inside the stream
    Error { message: String },
}

impl ChatChunk {
    /// Create a content chunk
    pub fn content(text: impl Into<String>) -> Self {
        Self::Content { text: text.into() }
    }

    /// Create an error chunk
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Create a finish chunk
    pub fn finish(reason: FinishReason) -> Self {
        Self::Finish { reason }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn is_finish(&self) -> bool {
        matches!(self, Self::Finish { .. })
    }

    /// Text carried by a content chunk
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Content { text } => Some(text),
            _ => None,
        }
    }
}

/// Reason for finishing the generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// Completed naturally
    Stop,
    /// Hit token limit
    Length,
    /// Blocked by the provider's safety filter
    ContentFilter,
    /// User cancelled
    Cancelled,
    /// Error occurred
    Error,
}

impl FinishReason {
    /// Map a provider finish reason string
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "STOP" => Self::Stop,
            "MAX_TOKENS" | "LENGTH" => Self::Length,
            "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" => Self::ContentFilter,
            _ => Self::Stop,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Length => "length",
            Self::ContentFilter => "content_filter",
            Self::Cancelled => "cancelled",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
