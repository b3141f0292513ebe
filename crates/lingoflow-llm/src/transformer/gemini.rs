use lingoflow_core::chat::{ChatChunk, ChatRequest, ChatResponse, ChatUsage, FinishReason, ResponseFormat};
use serde_json::{json, Map, Value};

use super::utils::{safe_get, safe_get_str, safe_get_u32};
use super::SchemaTransformer;
use crate::error::ConversionError;

/// Gemini `generateContent` wire format
#[derive(Debug, Clone, Default)]
pub struct GeminiTransformer;

impl GeminiTransformer {
    pub fn new() -> Self {
        Self
    }

    fn generation_config(request: &ChatRequest) -> Option<Value> {
        let options = &request.options;
        let mut config = Map::new();
        if let Some(temperature) = options.temperature {
            config.insert("temperature".into(), json!(temperature));
        }
        if let Some(max_tokens) = options.max_tokens {
            config.insert("maxOutputTokens".into(), json!(max_tokens));
        }
        if let Some(format) = &options.response_format {
            config.insert("responseMimeType".into(), json!(format.mime_type()));
            if let ResponseFormat::JsonSchema { schema } = format {
                config.insert("responseSchema".into(), schema.clone());
            }
        }
        (!config.is_empty()).then_some(Value::Object(config))
    }
}

/// Concatenated text of the first candidate's parts
fn candidate_text(data: &Value) -> Option<String> {
    let parts = safe_get(data, "candidates.0.content.parts")?.as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    Some(text)
}

fn usage(data: &Value) -> Option<ChatUsage> {
    data.get("usageMetadata")?;
    Some(ChatUsage {
        input_tokens: safe_get_u32(data, "usageMetadata.promptTokenCount").unwrap_or(0),
        output_tokens: safe_get_u32(data, "usageMetadata.candidatesTokenCount").unwrap_or(0),
    })
}

fn error_message(data: &Value) -> Option<String> {
    let error = data.get("error")?;
    Some(
        safe_get_str(error, "message")
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
    )
}

fn block_reason(data: &Value) -> Option<&str> {
    safe_get_str(data, "promptFeedback.blockReason")
}

impl SchemaTransformer for GeminiTransformer {
    fn provider_id(&self) -> &str {
        "gemini"
    }

    fn endpoint(&self, base_url: &str, request: &ChatRequest) -> String {
        let base = base_url.trim_end_matches('/');
        if request.options.stream {
            format!("{}/models/{}:streamGenerateContent?alt=sse", base, request.model)
        } else {
            format!("{}/models/{}:generateContent", base, request.model)
        }
    }

    fn transform_request(&self, request: &ChatRequest) -> Result<Value, ConversionError> {
        // Gemini rejects parts with empty text
        let contents: Vec<Value> = request
            .messages
            .iter()
            .filter(|m| !m.text.is_empty())
            .map(|m| {
                json!({
                    "role": m.role.to_string(),
                    "parts": [{ "text": m.text }],
                })
            })
            .collect();

        if contents.is_empty() {
            return Err(ConversionError::MissingField("contents".into()));
        }

        let mut body = Map::new();
        body.insert("contents".into(), Value::Array(contents));
        if let Some(instruction) = &request.system_instruction {
            body.insert(
                "systemInstruction".into(),
                json!({ "parts": [{ "text": instruction }] }),
            );
        }
        if let Some(config) = Self::generation_config(request) {
            body.insert("generationConfig".into(), config);
        }
        Ok(Value::Object(body))
    }

    fn parse_stream_chunk(&self, data: &str) -> Result<Vec<ChatChunk>, ConversionError> {
        let data = data.trim();
        if data.is_empty() {
            return Ok(Vec::new());
        }
        let value: Value = serde_json::from_str(data)?;

        if let Some(message) = error_message(&value) {
            return Ok(vec![ChatChunk::error(message)]);
        }
        if let Some(reason) = block_reason(&value) {
            return Ok(vec![ChatChunk::error(format!("prompt blocked: {}", reason))]);
        }

        let mut chunks = Vec::new();
        if let Some(text) = candidate_text(&value).filter(|t| !t.is_empty()) {
            chunks.push(ChatChunk::content(text));
        }
        if let Some(usage) = usage(&value) {
            chunks.push(ChatChunk::Usage {
                input_tokens: usage.input_tokens,
                output_tokens: usage.output_tokens,
            });
        }
        if let Some(reason) = safe_get_str(&value, "candidates.0.finishReason") {
            chunks.push(ChatChunk::finish(FinishReason::parse(reason)));
        }
        Ok(chunks)
    }

    fn parse_response(&self, data: &Value) -> Result<ChatResponse, ConversionError> {
        if let Some(message) = error_message(data) {
            return Err(ConversionError::InvalidFormat(message));
        }
        if let Some(reason) = block_reason(data) {
            return Err(ConversionError::Blocked(reason.to_string()));
        }

        let text = candidate_text(data)
            .ok_or_else(|| ConversionError::MissingField("candidates[0].content.parts".into()))?;
        let finish_reason = safe_get_str(data, "candidates.0.finishReason")
            .map(FinishReason::parse)
            .unwrap_or(FinishReason::Stop);

        let mut response = ChatResponse::new(text);
        response.finish_reason = finish_reason;
        if let Some(usage) = usage(data) {
            response = response.with_usage(usage);
        }
        Ok(response)
    }
}
