//! Prep material acquisition: topic in, briefing plus raw glossary out.

use std::sync::Arc;

use lingoflow_core::chat::ChatRequest;
use lingoflow_core::{PrepMaterial, RawTerm};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::error::LLMError;
use crate::provider::LLMProvider;

/// Notice shown to the user when acquisition fails
pub const PREP_FAILURE_NOTICE: &str = "Failed to generate prep material. Please try again.";

const SYSTEM_INSTRUCTION: &str =
    "You are LingoFlow, the world's most advanced interpreter preparation tool.";

#[derive(Error, Debug)]
pub enum PrepError {
    #[error("topic must not be blank")]
    BlankTopic,

    #[error("provider error: {0}")]
    Provider(#[from] LLMError),

    #[error("malformed prep material: {0}")]
    Malformed(String),
}

pub type PrepResult<T> = std::result::Result<T, PrepError>;

/// Briefing request for `topic`
pub fn prep_prompt(topic: &str) -> String {
    format!(
        "You are an expert conference interpreter and terminology specialist preparing for a high-level international summit.
Topic: \"{topic}\".

1. **Background Briefing**: Provide a highly detailed, deep-dive background summary (at least 15 points). Cover the current state of the industry, future trends, major technical challenges, and key geopolitical or economic factors. The more context, the better.
2. **Terminology Extraction**: Extract a comprehensive list of 50+ industry-specific technical terms, acronyms, and specialized collocations.
   - **Strictly avoid** general English words unless they have a specific technical meaning here.
   - **Prioritize** difficult, context-dependent jargon that an interpreter might stumble on.
   - Ensure Chinese translations are the precise, standard industry terms used in Mainland China."
    )
}

/// Response schema in Gemini's OpenAPI subset
pub fn prep_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "15+ comprehensive bullet points covering market trends, key technologies, controversies, regulatory landscape, and major stakeholders."
            },
            "terms": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "english": { "type": "STRING", "description": "The English technical term or phrase" },
                        "chinese": { "type": "STRING", "description": "The standard Mainland China industry translation" },
                        "definition": { "type": "STRING", "description": "A concise definition in English (10-15 words)" }
                    },
                    "required": ["english", "chinese", "definition"]
                },
                "description": "A massive list of 50-80 highly relevant, industry-specific technical terms. Focus on low-frequency, high-value jargon."
            }
        },
        "required": ["summary", "terms"]
    })
}

/// Fetches prep material from a provider
pub struct PrepService {
    provider: Arc<dyn LLMProvider>,
    model: Option<String>,
}

impl PrepService {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            model: None,
        }
    }

    /// Override the provider's default model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    fn model(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| self.provider.default_model().to_string())
    }

    /// Ask the provider for a briefing and glossary on `topic`
    pub async fn acquire(&self, topic: &str) -> PrepResult<PrepMaterial> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(PrepError::BlankTopic);
        }

        info!(topic, "requesting prep material");
        let request = ChatRequest::new(self.model())
            .with_system_instruction(SYSTEM_INSTRUCTION)
            .with_prompt(prep_prompt(topic))
            .json_schema(prep_schema());

        let response = self.provider.chat(request).await?;
        let material = parse_prep_material(&response.text)?;
        info!(
            topic,
            summary = material.summary.len(),
            terms = material.terms.len(),
            "prep material received"
        );
        Ok(material)
    }
}

/// Lenient parse of the model's JSON answer
///
/// Missing sections come back empty; terms lacking a field are dropped.
pub fn parse_prep_material(text: &str) -> PrepResult<PrepMaterial> {
    let value: Value = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| PrepError::Malformed(e.to_string()))?;
    if !value.is_object() {
        return Err(PrepError::Malformed("expected a JSON object".into()));
    }

    let summary = value
        .get("summary")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let mut terms = Vec::new();
    let raw_terms = value.get("terms").and_then(Value::as_array);
    for (index, raw) in raw_terms.into_iter().flatten().enumerate() {
        match serde_json::from_value::<RawTerm>(raw.clone()) {
            Ok(term) => terms.push(term),
            Err(e) => warn!(index, "skipping incomplete term: {}", e),
        }
    }

    Ok(PrepMaterial::new(summary, terms))
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_names_topic() {
        let prompt = prep_prompt("Offshore wind");
        assert!(prompt.contains("Topic: \"Offshore wind\"."));
        assert!(prompt.contains("50+"));
    }

    #[test]
    fn test_schema_requires_all_term_fields() {
        let schema = prep_schema();
        assert_eq!(schema["required"], json!(["summary", "terms"]));
        assert_eq!(
            schema["properties"]["terms"]["items"]["required"],
            json!(["english", "chinese", "definition"])
        );
    }

    #[test]
    fn test_parse_skips_incomplete_terms() {
        let text = r#"{
            "summary": ["Capacity is growing", 42],
            "terms": [
                {"english": "monopile", "chinese": "单桩", "definition": "Single large foundation pile"},
                {"english": "jacket"},
                {"english": "wake effect", "chinese": "尾流效应", "definition": "Downstream wind speed loss"}
            ]
        }"#;
        let material = parse_prep_material(text).unwrap();
        assert_eq!(material.summary, vec!["Capacity is growing".to_string()]);
        assert_eq!(material.terms.len(), 2);
        assert_eq!(material.terms[1].chinese, "尾流效应");
    }

    #[test]
    fn test_parse_missing_sections_are_empty() {
        let material = parse_prep_material("{}").unwrap();
        assert!(material.summary.is_empty());
        assert!(material.terms.is_empty());
    }

    #[test]
    fn test_parse_fenced_json() {
        let material = parse_prep_material("```json\n{\"summary\":[\"a\"]}\n```").unwrap();
        assert_eq!(material.summary.len(), 1);
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert!(matches!(parse_prep_material("[]"), Err(PrepError::Malformed(_))));
        assert!(matches!(parse_prep_material("nope"), Err(PrepError::Malformed(_))));
    }
}
