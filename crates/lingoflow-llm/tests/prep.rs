mod common;

use std::sync::Arc;

use common::MockLLMProvider;
use lingoflow_core::ResponseFormat;
use lingoflow_llm::{PrepError, PrepService};

const MATERIAL: &str = r#"{
    "summary": ["Perovskite efficiency records keep climbing", "Stability remains the main barrier"],
    "terms": [
        {"english": "tandem cell", "chinese": "叠层电池", "definition": "Stacked cells absorbing different parts of the spectrum"},
        {"english": "passivation", "chinese": "钝化", "definition": "Surface treatment reducing recombination losses"},
        {"english": "bifacial", "definition": "Generates power from both sides"}
    ]
}"#;

#[tokio::test]
async fn test_acquire_builds_structured_request() {
    let provider = Arc::new(MockLLMProvider::with_response(MATERIAL));
    let service = PrepService::new(provider.clone()).with_model("gemini-2.5-pro");

    let material = service.acquire("  Perovskite solar cells ").await.unwrap();
    assert_eq!(material.summary.len(), 2);
    assert_eq!(material.terms.len(), 2);

    let request = &provider.requests()[0];
    assert_eq!(request.model, "gemini-2.5-pro");
    assert!(!request.options.stream);
    assert!(request
        .system_instruction
        .as_deref()
        .unwrap()
        .starts_with("You are LingoFlow"));
    assert!(request
        .last_user_text()
        .unwrap()
        .contains("Topic: \"Perovskite solar cells\"."));
    assert!(matches!(
        request.options.response_format,
        Some(ResponseFormat::JsonSchema { .. })
    ));
}

#[tokio::test]
async fn test_terms_get_topic_tag_when_wrapped() {
    let provider = Arc::new(MockLLMProvider::with_response(MATERIAL));
    let material = PrepService::new(provider).acquire("PV").await.unwrap();
    let (_, terms) = material.into_parts("PV");
    assert!(terms.iter().all(|t| t.tags == vec!["PV".to_string()] && t.mastery_level == 0));
    assert_ne!(terms[0].id, terms[1].id);
}

#[tokio::test]
async fn test_blank_topic_makes_no_call() {
    let provider = Arc::new(MockLLMProvider::with_response(MATERIAL));
    let err = PrepService::new(provider.clone()).acquire(" \t").await.unwrap_err();
    assert!(matches!(err, PrepError::BlankTopic));
    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn test_garbage_response_is_malformed() {
    let provider = Arc::new(MockLLMProvider::with_response("I cannot help with that."));
    let err = PrepService::new(provider).acquire("PV").await.unwrap_err();
    assert!(matches!(err, PrepError::Malformed(_)));
}
