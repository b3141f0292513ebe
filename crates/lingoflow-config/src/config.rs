use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 主配置结构体
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub version: String,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub drill: DrillConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            llm: LlmConfig::default(),
            storage: StorageConfig::default(),
            drill: DrillConfig::default(),
            speech: SpeechConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn parse_number<T: std::str::FromStr>(value: &str) -> ConfigResult<T> {
    value
        .parse()
        .map_err(|_| ConfigError::Validation(format!("Invalid number: {}", value)))
}

fn parse_bool(value: &str) -> ConfigResult<bool> {
    value
        .parse()
        .map_err(|_| ConfigError::Validation(format!("Invalid boolean: {}", value)))
}

impl Config {
    /// 获取配置值的快捷方法
    pub fn get_value(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["version"] => Some(self.version.clone()),
            ["llm", "default_provider"] => Some(self.llm.default_provider.clone()),
            ["llm", "prep_model"] => self.llm.prep_model.clone(),
            ["llm", "chat_model"] => self.llm.chat_model.clone(),
            ["llm", "providers", name, "base_url"] => {
                self.llm.providers.get(*name).map(|p| p.base_url.clone())
            }
            ["llm", "providers", name, "model"] => {
                self.llm.providers.get(*name).and_then(|p| p.model.clone())
            }
            ["llm", "providers", name, "enabled"] => {
                self.llm.providers.get(*name).map(|p| p.enabled.to_string())
            }
            ["storage", "path"] => Some(self.storage.path.clone()),
            ["storage", "key"] => Some(self.storage.key.clone()),
            ["drill", "countdown_from"] => Some(self.drill.countdown_from.to_string()),
            ["drill", "countdown_step_ms"] => Some(self.drill.countdown_step_ms.to_string()),
            ["drill", "card_duration_ms"] => Some(self.drill.card_duration_ms.to_string()),
            ["drill", "reveal_hold_ms"] => Some(self.drill.reveal_hold_ms.to_string()),
            ["drill", "frame_interval_ms"] => Some(self.drill.frame_interval_ms.to_string()),
            ["speech", "enabled"] => Some(self.speech.enabled.to_string()),
            ["speech", "command"] => self.speech.command.clone(),
            ["speech", "lang"] => Some(self.speech.lang.clone()),
            ["logging", "level"] => Some(self.logging.level.as_str().to_string()),
            ["logging", "json"] => Some(self.logging.json.to_string()),
            ["logging", "directory"] => self.logging.directory.clone(),
            _ => None,
        }
    }

    /// 设置配置值
    pub fn set_value(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["llm", "default_provider"] => {
                self.llm.default_provider = value.to_string();
            }
            ["llm", "prep_model"] => {
                self.llm.prep_model = Some(value.to_string());
            }
            ["llm", "chat_model"] => {
                self.llm.chat_model = Some(value.to_string());
            }
            ["llm", "providers", name, field] => {
                let provider = self
                    .llm
                    .providers
                    .get_mut(*name)
                    .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))?;
                match *field {
                    "base_url" => provider.base_url = value.to_string(),
                    "model" => provider.model = Some(value.to_string()),
                    "enabled" => provider.enabled = parse_bool(value)?,
                    "timeout_seconds" => provider.timeout_seconds = Some(parse_number(value)?),
                    _ => return Err(ConfigError::KeyNotFound(key.to_string())),
                }
            }
            ["storage", "path"] => {
                self.storage.path = value.to_string();
            }
            ["storage", "key"] => {
                self.storage.key = value.to_string();
            }
            ["drill", "countdown_from"] => {
                self.drill.countdown_from = parse_number(value)?;
            }
            ["drill", "countdown_step_ms"] => {
                self.drill.countdown_step_ms = parse_number(value)?;
            }
            ["drill", "card_duration_ms"] => {
                self.drill.card_duration_ms = parse_number(value)?;
            }
            ["drill", "reveal_hold_ms"] => {
                self.drill.reveal_hold_ms = parse_number(value)?;
            }
            ["drill", "frame_interval_ms"] => {
                self.drill.frame_interval_ms = parse_number(value)?;
            }
            ["speech", "enabled"] => {
                self.speech.enabled = parse_bool(value)?;
            }
            ["speech", "command"] => {
                self.speech.command = Some(value.to_string());
            }
            ["speech", "lang"] => {
                self.speech.lang = value.to_string();
            }
            ["logging", "level"] => {
                self.logging.level = value.parse()?;
            }
            ["logging", "json"] => {
                self.logging.json = parse_bool(value)?;
            }
            ["logging", "directory"] => {
                self.logging.directory = Some(value.to_string());
            }
            _ => return Err(ConfigError::KeyNotFound(key.to_string())),
        }
        Ok(())
    }

    /// 当前默认 provider 的设置
    pub fn default_provider(&self) -> Option<&ProviderSettings> {
        self.llm.providers.get(&self.llm.default_provider)
    }
}

/// LLM 配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmConfig {
    pub default_provider: String,
    pub providers: HashMap<String, ProviderSettings>,
    /// 备课资料使用的模型，缺省时用 provider 的模型
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prep_model: Option<String>,
    /// 对话助手使用的模型
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_model: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        let mut providers = HashMap::new();
        providers.insert(
            "gemini".to_string(),
            ProviderSettings {
                enabled: true,
                base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
                model: Some("gemini-2.5-flash".to_string()),
                auth: AuthSettings::ApiKey {
                    env: "GEMINI_API_KEY".to_string(),
                },
                headers: None,
                timeout_seconds: Some(120),
            },
        );

        Self {
            default_provider: "gemini".to_string(),
            providers,
            prep_model: None,
            chat_model: None,
        }
    }
}

/// Provider 配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderSettings {
    pub enabled: bool,
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(flatten)]
    pub auth: AuthSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

/// Authentication settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "auth_type", rename_all = "snake_case")]
pub enum AuthSettings {
    /// API Key authentication - reads from environment variable
    ApiKey { env: String },
    /// Bearer token authentication - reads from environment variable
    Bearer { env: String },
    /// No authentication
    #[default]
    None,
}

impl AuthSettings {
    /// Get API key from environment if applicable
    pub fn get_api_key(&self) -> Option<String> {
        match self {
            Self::ApiKey { env } => std::env::var(env).ok().filter(|v| !v.is_empty()),
            _ => None,
        }
    }

    /// Get bearer token from environment if applicable
    pub fn get_bearer_token(&self) -> Option<String> {
        match self {
            Self::Bearer { env } => std::env::var(env).ok().filter(|v| !v.is_empty()),
            _ => None,
        }
    }
}

/// Storage 配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// 会话文件所在目录
    pub path: String,
    /// 存储键，也是文件名
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "~/.lingoflow".to_string(),
            key: "lingoflow_sessions".to_string(),
        }
    }
}

/// 速记训练计时
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrillConfig {
    pub countdown_from: u32,
    pub countdown_step_ms: u64,
    pub card_duration_ms: u64,
    pub reveal_hold_ms: u64,
    pub frame_interval_ms: u64,
}

impl Default for DrillConfig {
    fn default() -> Self {
        Self {
            countdown_from: 3,
            countdown_step_ms: 1000,
            card_duration_ms: 5000,
            reveal_hold_ms: 1500,
            frame_interval_ms: 16,
        }
    }
}

/// 朗读配置
///
/// `args` 中的 `{lang}` 与 `{text}` 会在调用时被替换。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpeechConfig {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    pub lang: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            command: Some("espeak-ng".to_string()),
            args: vec!["-v".to_string(), "{lang}".to_string(), "{text}".to_string()],
            lang: "zh-CN".to_string(),
        }
    }
}

/// 日志级别
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::Validation(format!("Invalid log level: {}", s))),
        }
    }
}

/// Logging 配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    pub level: LogLevel,
    /// 以 JSON 行输出
    #[serde(default)]
    pub json: bool,
    /// 按天滚动的日志目录，缺省时只写 stderr
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
            json: false,
            directory: None,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.llm.default_provider, "gemini");
        assert_eq!(config.storage.key, "lingoflow_sessions");
        assert_eq!(config.drill.card_duration_ms, 5000);
        assert!(config.default_provider().is_some());
    }

    #[test]
    fn test_get_and_set_dotted_keys() {
        let mut config = Config::default();
        config.set_value("drill.reveal_hold_ms", "900").unwrap();
        config.set_value("llm.providers.gemini.model", "gemini-2.5-pro").unwrap();
        config.set_value("logging.level", "DEBUG").unwrap();

        assert_eq!(config.get_value("drill.reveal_hold_ms").as_deref(), Some("900"));
        assert_eq!(
            config.get_value("llm.providers.gemini.model").as_deref(),
            Some("gemini-2.5-pro")
        );
        assert_eq!(config.get_value("logging.level").as_deref(), Some("debug"));
    }

    #[test]
    fn test_set_value_rejects_bad_input() {
        let mut config = Config::default();
        assert!(matches!(
            config.set_value("drill.card_duration_ms", "soon"),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            config.set_value("llm.providers.openai.model", "x"),
            Err(ConfigError::KeyNotFound(_))
        ));
        assert!(matches!(
            config.set_value("server.port", "80"),
            Err(ConfigError::KeyNotFound(_))
        ));
    }

    #[test]
    fn test_provider_settings_serialization() {
        let settings = LlmConfig::default().providers["gemini"].clone();
        let toml = toml::to_string(&settings).unwrap();
        assert!(toml.contains("auth_type"));
        assert!(toml.contains("api_key"));
        assert!(toml.contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: Config = serde_json::from_str(r#"{"version": "0.0.1"}"#).unwrap();
        assert_eq!(config.drill, DrillConfig::default());
        assert_eq!(config.speech.lang, "zh-CN");
    }
}
