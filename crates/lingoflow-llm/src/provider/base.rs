use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use lingoflow_core::chat::{ChatRequest, ChatResponse};
use reqwest::{header, Client};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use std::sync::Arc;

use crate::auth::{ApiKeyAuth, Authenticator, BearerAuth, NoAuth};
use crate::error::{LLMError, Result};
use crate::provider::{AuthConfig, LLMProvider, ProviderConfig, ProviderMetadata};
use crate::transformer::{LLMStream, SchemaTransformer};

/// Base provider implementation
/// Handles common HTTP functionality and delegates schema transformation
pub struct BaseProvider<T: SchemaTransformer> {
    config: ProviderConfig,
    http_client: reqwest_middleware::ClientWithMiddleware,
    transformer: Arc<T>,
    pub metadata: ProviderMetadata,
    authenticator: Arc<dyn Authenticator>,
}

impl<T: SchemaTransformer + 'static> BaseProvider<T> {
    /// Create a new base provider, picking the authenticator from the config
    pub fn new(config: ProviderConfig, transformer: T, metadata: ProviderMetadata) -> Result<Self> {
        let authenticator: Arc<dyn Authenticator> = match &config.auth {
            AuthConfig::ApiKey { key, header } => {
                Arc::new(ApiKeyAuth::with_header(key.clone(), header.clone()))
            }
            AuthConfig::Bearer { token } => Arc::new(BearerAuth::new(token.clone())),
            AuthConfig::None => Arc::new(NoAuth),
        };
        Self::with_authenticator(config, transformer, metadata, authenticator)
    }

    /// Create with a custom authenticator
    pub fn with_authenticator(
        config: ProviderConfig,
        transformer: T,
        metadata: ProviderMetadata,
        authenticator: Arc<dyn Authenticator>,
    ) -> Result<Self> {
        let http_client = build_client(&config)?;
        Ok(Self {
            config,
            http_client,
            transformer: Arc::new(transformer),
            metadata,
            authenticator,
        })
    }

    /// Get the provider ID
    pub fn provider_id(&self) -> &str {
        self.transformer.provider_id()
    }

    /// Get the config
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Fill in the configured model when the request leaves it blank
    fn with_default_model(&self, mut request: ChatRequest) -> ChatRequest {
        if request.model.trim().is_empty() {
            request.model = self.config.model.clone();
        }
        request
    }

    /// Build request headers
    async fn build_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        if let Some((header_name, header_value)) = self.authenticator.get_auth_header().await? {
            let name = header::HeaderName::from_bytes(header_name.as_bytes())
                .map_err(|e| LLMError::Config(format!("Invalid auth header name: {}", e)))?;
            let value = header::HeaderValue::from_str(&header_value)
                .map_err(|e| LLMError::Config(format!("Invalid auth header value: {}", e)))?;
            headers.insert(name, value);
        }

        for (key, value) in &self.config.headers {
            let header_name = header::HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| LLMError::Config(format!("Invalid header name: {}", e)))?;
            let header_value = header::HeaderValue::from_str(value)
                .map_err(|e| LLMError::Config(format!("Invalid header value: {}", e)))?;
            headers.insert(header_name, header_value);
        }

        Ok(headers)
    }

    async fn post(&self, request: &ChatRequest) -> Result<reqwest::Response> {
        let body = self.transformer.transform_request(request)?;
        let headers = self.build_headers().await?;
        let url = self.transformer.endpoint(&self.config.base_url, request);

        tracing::debug!(model = %request.model, stream = request.options.stream, "POST {}", url);

        let response = self
            .http_client
            .post(&url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| LLMError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = retry_after_secs(response.headers());
        let error_text = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), "provider returned an error: {}", error_text);
        Err(match status.as_u16() {
            401 | 403 => LLMError::Auth(error_text),
            429 => LLMError::RateLimited { retry_after },
            code => LLMError::Api {
                status: code,
                message: error_text,
            },
        })
    }

    /// Send a non-streaming request
    pub async fn send_request(&self, request: ChatRequest) -> Result<ChatResponse> {
        let mut request = self.with_default_model(request);
        request.options.stream = false;

        let response = self.post(&request).await?;
        let response_data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LLMError::Network(e.to_string()))?;

        Ok(self.transformer.parse_response(&response_data)?)
    }

    /// Send a streaming request
    pub async fn send_stream_request(&self, request: ChatRequest) -> Result<LLMStream> {
        let mut request = self.with_default_model(request);
        request.options.stream = true;

        let response = self.post(&request).await?;
        let transformer = self.transformer.clone();
        let stream = response
            .bytes_stream()
            .eventsource()
            .map(move |event| match event {
                Ok(event) => match transformer.parse_stream_chunk(&event.data) {
                    Ok(chunks) => chunks.into_iter().map(Ok).collect::<Vec<_>>(),
                    Err(e) => vec![Err(LLMError::Transform(e))],
                },
                Err(e) => vec![Err(LLMError::Stream(e.to_string()))],
            })
            .flat_map(futures::stream::iter);

        Ok(Box::pin(stream))
    }
}

fn build_client(config: &ProviderConfig) -> Result<reqwest_middleware::ClientWithMiddleware> {
    let retry_policy = ExponentialBackoff::builder()
        .base(2)
        .build_with_max_retries(config.max_retries);

    let client = Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|e| LLMError::Config(e.to_string()))?;

    Ok(reqwest_middleware::ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

#[async_trait]
impl<T: SchemaTransformer + 'static> LLMProvider for BaseProvider<T> {
    fn provider_id(&self) -> &str {
        self.provider_id()
    }

    fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }

    fn default_model(&self) -> &str {
        &self.config.model
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.send_request(request).await
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<LLMStream> {
        self.send_stream_request(request).await
    }

    async fn validate(&self) -> Result<()> {
        if matches!(self.config.auth, AuthConfig::None) {
            return Err(LLMError::Auth(format!(
                "no credentials configured for provider '{}'",
                self.config.provider_id
            )));
        }
        let _ = self.build_headers().await?;
        Ok(())
    }
}

/// Delay-seconds form of `Retry-After`; the HTTP-date form is ignored
fn retry_after_secs(headers: &header::HeaderMap) -> Option<u64> {
    headers
        .get(header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
