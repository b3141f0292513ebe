use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::auth::GOOG_API_KEY_HEADER;

/// Authentication configuration enum
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    /// API key sent in a header
    ApiKey {
        /// The API key
        key: String,
        /// Header carrying the key
        #[serde(default = "default_api_key_header")]
        header: String,
    },
    /// Bearer token authentication
    Bearer {
        /// The bearer token
        token: String,
    },
    /// No authentication
    #[default]
    None,
}

fn default_api_key_header() -> String {
    GOOG_API_KEY_HEADER.to_string()
}

impl AuthConfig {
    /// Create API key auth from environment variable
    pub fn from_env(env_var: &str) -> Option<Self> {
        std::env::var(env_var)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(|key| Self::ApiKey {
                key,
                header: default_api_key_header(),
            })
    }
}

/// Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider ID
    pub provider_id: String,
    /// Base URL for the API
    pub base_url: String,
    /// Authentication configuration
    #[serde(flatten)]
    pub auth: AuthConfig,
    /// Default model to use
    pub model: String,
    /// Request timeout in seconds
    #[serde(with = "serde_duration", default = "default_timeout")]
    pub timeout: Duration,
    /// Additional headers to include
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Retries for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl ProviderConfig {
    /// Create a new provider config
    pub fn new(provider_id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.auth = AuthConfig::ApiKey {
            key: key.into(),
            header: default_api_key_header(),
        };
        self
    }

    /// Set bearer token
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.auth = AuthConfig::Bearer {
            token: token.into(),
        };
        self
    }

    /// Set model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add a custom header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set retry budget for transient failures
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_id: "gemini".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            auth: AuthConfig::None,
            model: "gemini-2.5-flash".to_string(),
            timeout: default_timeout(),
            headers: HashMap::new(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_max_retries() -> u32 {
    3
}

// Custom serialization for Duration
mod serde_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_point_at_gemini() {
        let config = ProviderConfig::default();
        assert_eq!(config.model, "gemini-2.5-flash");
        assert!(config.base_url.ends_with("/v1beta"));
        assert_eq!(config.auth, AuthConfig::None);
    }

    #[test]
    fn test_deserialize_flattened_auth() {
        let json = r#"{
            "provider_id": "gemini",
            "base_url": "http://localhost:9999",
            "type": "api_key",
            "key": "abc",
            "model": "gemini-2.5-pro",
            "timeout": 30
        }"#;
        let config: ProviderConfig = serde_json::from_str(json).unwrap();
        assert_eq!(
            config.auth,
            AuthConfig::ApiKey {
                key: "abc".into(),
                header: "x-goog-api-key".into()
            }
        );
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
    }
}
