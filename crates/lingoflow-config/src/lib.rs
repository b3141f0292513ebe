pub mod config;
pub mod manager;

pub use config::{
    AuthSettings, Config, ConfigError, ConfigResult, DrillConfig, LlmConfig, LogLevel,
    LoggingConfig, ProviderSettings, SpeechConfig, StorageConfig,
};
pub use manager::ConfigManager;

use std::path::PathBuf;

/// 获取 LingoFlow 配置目录路径
pub fn lingoflow_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".lingoflow"))
}

/// 获取默认配置文件路径
pub fn default_config_path() -> Option<PathBuf> {
    lingoflow_dir().map(|dir| dir.join("config.json"))
}

/// 展开路径中的 ~ 为用户主目录
pub fn expand_tilde(path: &str) -> Option<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None if path == "~" => dirs::home_dir(),
        None => Some(PathBuf::from(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lingoflow_dir() {
        let dir = lingoflow_dir();
        assert!(dir.is_some());
        assert!(dir.unwrap().to_string_lossy().contains(".lingoflow"));
    }

    #[test]
    fn test_expand_tilde() {
        let expanded = expand_tilde("~/.lingoflow/config.json");
        assert!(expanded.is_some());
        assert!(!expanded.unwrap().to_string_lossy().starts_with('~'));
        assert_eq!(expand_tilde("/tmp/x"), Some(PathBuf::from("/tmp/x")));
    }
}
