//! 日志配置

use std::collections::HashMap;
use std::path::PathBuf;

/// 日志配置
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 日志级别（trace, debug, info, warn, error）
    pub level: String,

    /// 是否使用 JSON 格式
    pub json_format: bool,

    /// 按天滚动的日志目录
    pub directory: Option<PathBuf>,

    /// 日志文件名前缀
    pub file_prefix: String,

    /// 模块级别的日志配置
    pub module_levels: HashMap<String, String>,

    /// 是否启用 ANSI 颜色
    pub ansi_colors: bool,

    /// 是否包含目标（target）
    pub include_target: bool,

    /// 是否优先使用 RUST_LOG
    pub respect_env: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json_format: false,
            directory: None,
            file_prefix: "lingoflow.log".to_string(),
            module_levels: HashMap::new(),
            ansi_colors: true,
            include_target: true,
            respect_env: true,
        }
    }
}

impl LogConfig {
    /// 设置日志级别
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// 设置是否使用 JSON 格式
    pub fn with_json_format(mut self, json: bool) -> Self {
        self.json_format = json;
        self
    }

    /// 写入按天滚动的日志文件
    pub fn with_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.directory = Some(dir.into());
        self
    }

    /// 添加模块特定的日志级别
    pub fn with_module_level(mut self, module: impl Into<String>, level: impl Into<String>) -> Self {
        self.module_levels.insert(module.into(), level.into());
        self
    }

    /// 忽略 RUST_LOG
    pub fn ignore_env(mut self) -> Self {
        self.respect_env = false;
        self
    }
}
