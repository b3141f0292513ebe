use async_trait::async_trait;

use crate::error::Result;

/// Header Gemini reads the API key from
pub const GOOG_API_KEY_HEADER: &str = "x-goog-api-key";

/// Authenticator trait for different authentication methods
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Get the authentication header (header_name, header_value)
    /// Returns None if no authentication is needed
    async fn get_auth_header(&self) -> Result<Option<(String, String)>>;
}

/// API key sent in a provider-specific header
#[derive(Debug, Clone)]
pub struct ApiKeyAuth {
    api_key: String,
    header: String,
}

impl ApiKeyAuth {
    /// API key in the `x-goog-api-key` header
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_header(api_key, GOOG_API_KEY_HEADER)
    }

    pub fn with_header(api_key: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            header: header.into(),
        }
    }
}

#[async_trait]
impl Authenticator for ApiKeyAuth {
    async fn get_auth_header(&self) -> Result<Option<(String, String)>> {
        Ok(Some((self.header.clone(), self.api_key.clone())))
    }
}

/// Bearer token authenticator
#[derive(Debug, Clone)]
pub struct BearerAuth {
    token: String,
}

impl BearerAuth {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl Authenticator for BearerAuth {
    async fn get_auth_header(&self) -> Result<Option<(String, String)>> {
        Ok(Some((
            "Authorization".to_string(),
            format!("Bearer {}", self.token),
        )))
    }
}

/// No authentication
#[derive(Debug, Clone)]
pub struct NoAuth;

#[async_trait]
impl Authenticator for NoAuth {
    async fn get_auth_header(&self) -> Result<Option<(String, String)>> {
        Ok(None)
    }
}
