use futures::StreamExt;
use lingoflow_core::chat::{ChatChunk, ChatRequest, FinishReason};
use lingoflow_core::ChatMessage;
use lingoflow_llm::{build_provider, LLMError, LLMProvider, PrepService, ProviderConfig};
use mockito::Matcher;
use std::sync::Arc;

fn provider(base_url: String) -> Arc<dyn LLMProvider> {
    let config = ProviderConfig::new("gemini", base_url)
        .with_api_key("test-key")
        .with_max_retries(0);
    build_provider(config).unwrap()
}

#[tokio::test]
async fn test_generate_content_round_trip() {
    let mut server = mockito::Server::new_async().await;
    let answer = serde_json::json!({
        "summary": ["Point one"],
        "terms": [{"english": "offtake", "chinese": "包销", "definition": "Agreement to buy future output"}]
    })
    .to_string();
    let body = serde_json::json!({
        "candidates": [{"content": {"role": "model", "parts": [{"text": answer}]}, "finishReason": "STOP"}],
        "usageMetadata": {"promptTokenCount": 100, "candidatesTokenCount": 40}
    });

    let mock = server
        .mock("POST", "/models/gemini-2.5-flash:generateContent")
        .match_header("x-goog-api-key", "test-key")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "generationConfig": {"responseMimeType": "application/json"}
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await;

    let material = PrepService::new(provider(server.url()))
        .acquire("Hydrogen offtake")
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(material.terms[0].chinese, "包销");
}

#[tokio::test]
async fn test_stream_generate_content_sse() {
    let mut server = mockito::Server::new_async().await;
    let sse = concat!(
        "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"Elec\"}]}}]}\n\n",
        "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"trolysis\"}]}}]}\n\n",
        "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\" (电解)\"}]},\"finishReason\":\"STOP\"}],\"usageMetadata\":{\"promptTokenCount\":5,\"candidatesTokenCount\":4}}\n\n",
    );

    let mock = server
        .mock("POST", "/models/gemini-2.5-flash:streamGenerateContent")
        .match_query(Matcher::UrlEncoded("alt".into(), "sse".into()))
        .match_header("x-goog-api-key", "test-key")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(sse)
        .create_async()
        .await;

    let request = ChatRequest::new("").with_message(ChatMessage::user("Explain electrolysis"));
    let mut stream = provider(server.url()).chat_stream(request).await.unwrap();

    let mut text = String::new();
    let mut finish = None;
    while let Some(chunk) = stream.next().await {
        match chunk.unwrap() {
            ChatChunk::Content { text: t } => text.push_str(&t),
            ChatChunk::Finish { reason } => finish = Some(reason),
            _ => {}
        }
    }

    mock.assert_async().await;
    assert_eq!(text, "Electrolysis (电解)");
    assert_eq!(finish, Some(FinishReason::Stop));
}

#[tokio::test]
async fn test_status_codes_map_to_errors() {
    let mut server = mockito::Server::new_async().await;
    let _denied = server
        .mock("POST", "/models/denied:generateContent")
        .with_status(403)
        .with_body("API key not valid")
        .create_async()
        .await;
    let _busy = server
        .mock("POST", "/models/busy:generateContent")
        .with_status(429)
        .with_header("retry-after", "17")
        .with_body("quota exceeded")
        .create_async()
        .await;
    let _busy_no_hint = server
        .mock("POST", "/models/busy-no-hint:generateContent")
        .with_status(429)
        .with_body("quota exceeded")
        .create_async()
        .await;
    let _bad = server
        .mock("POST", "/models/bad:generateContent")
        .with_status(400)
        .with_body("invalid argument")
        .create_async()
        .await;

    let provider = provider(server.url());
    let prompt = || ChatMessage::user("hi");

    let err = provider
        .chat(ChatRequest::new("denied").with_message(prompt()))
        .await
        .unwrap_err();
    assert!(matches!(err, LLMError::Auth(msg) if msg.contains("API key")));

    let err = provider
        .chat(ChatRequest::new("busy").with_message(prompt()))
        .await
        .unwrap_err();
    assert!(matches!(err, LLMError::RateLimited { retry_after: Some(17) }));
    assert_eq!(err.to_string(), "rate limited, retry after 17s");

    let err = provider
        .chat(ChatRequest::new("busy-no-hint").with_message(prompt()))
        .await
        .unwrap_err();
    assert!(matches!(err, LLMError::RateLimited { retry_after: None }));

    let err = provider
        .chat(ChatRequest::new("bad").with_message(prompt()))
        .await
        .unwrap_err();
    assert!(matches!(err, LLMError::Api { status: 400, .. }));
}
