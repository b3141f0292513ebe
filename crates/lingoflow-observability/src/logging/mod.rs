//! 结构化日志模块
//!
//! 提供基于 tracing 的结构化日志功能。

use parking_lot::RwLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt,
    layer::{Layered, SubscriberExt},
    reload::{self, Handle},
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::config::LogConfig;
use crate::error::{ObservabilityError, Result};

/// 日志级别重新加载句柄类型
type ReloadHandle = Handle<EnvFilter, Registry>;

type Base = Layered<reload::Layer<EnvFilter, Registry>, Registry>;
type BoxedLayer = Box<dyn Layer<Base> + Send + Sync>;

/// 日志管理器
///
/// 持有文件写入线程的 guard，丢弃时会刷新尚未写出的日志。
pub struct LogManager {
    config: LogConfig,
    level: RwLock<String>,
    reload_handle: ReloadHandle,
    _file_guard: Option<WorkerGuard>,
}

impl std::fmt::Debug for LogManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogManager")
            .field("level", &*self.level.read())
            .field("directory", &self.config.directory)
            .finish()
    }
}

impl LogManager {
    /// 安装全局 subscriber
    ///
    /// 每个进程只能成功调用一次。
    pub fn init(config: LogConfig) -> Result<Self> {
        let (filter, level) = build_filter(&config)?;
        let (filter, reload_handle) = reload::Layer::new(filter);

        let mut layers: Vec<BoxedLayer> = vec![stderr_layer(&config)];

        let mut file_guard = None;
        if let Some(dir) = &config.directory {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, &config.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            file_guard = Some(guard);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(config.include_target);
            layers.push(if config.json_format {
                layer.json().boxed()
            } else {
                layer.boxed()
            });
        }

        tracing_subscriber::registry()
            .with(filter)
            .with(layers)
            .try_init()
            .map_err(|e| ObservabilityError::init(e.to_string()))?;

        tracing::debug!(
            target: "lingoflow_observability",
            "Log manager initialized with filter: {}",
            level
        );

        Ok(Self {
            config,
            level: RwLock::new(level),
            reload_handle,
            _file_guard: file_guard,
        })
    }

    /// 动态更新日志级别
    pub fn update_level(&self, level: &str) -> Result<()> {
        let new_filter = EnvFilter::try_new(level)
            .map_err(|e| ObservabilityError::logging(format!("Invalid log level: {}", e)))?;

        self.reload_handle
            .modify(|filter| *filter = new_filter)
            .map_err(|e| ObservabilityError::logging(format!("Failed to update log level: {}", e)))?;
        *self.level.write() = level.to_string();

        tracing::info!(target: "lingoflow_observability", "Log level updated to: {}", level);
        Ok(())
    }

    /// 当前过滤规则
    pub fn level(&self) -> String {
        self.level.read().clone()
    }

    /// 获取当前配置
    pub fn config(&self) -> &LogConfig {
        &self.config
    }
}

fn stderr_layer(config: &LogConfig) -> BoxedLayer {
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(config.include_target)
        .with_ansi(config.ansi_colors);
    if config.json_format {
        layer.json().boxed()
    } else {
        layer.boxed()
    }
}

/// 构建环境过滤器，RUST_LOG 优先
///
/// 同时返回生效的过滤规则文本。
pub(crate) fn build_filter(config: &LogConfig) -> Result<(EnvFilter, String)> {
    if config.respect_env {
        if let Ok(directives) = std::env::var(EnvFilter::DEFAULT_ENV) {
            if let Ok(filter) = EnvFilter::try_new(&directives) {
                return Ok((filter, directives));
            }
        }
    }

    let mut filter = EnvFilter::try_new(&config.level)
        .map_err(|e| ObservabilityError::config(format!("Invalid log level: {}", e)))?;

    for (module, level) in &config.module_levels {
        filter = filter.add_directive(
            format!("{}={}", module, level)
                .parse()
                .map_err(|e| ObservabilityError::config(format!("Invalid directive: {}", e)))?,
        );
    }

    let mut level = config.level.clone();
    for (module, module_level) in &config.module_levels {
        level.push_str(&format!(",{}={}", module, module_level));
    }
    Ok((filter, level))
}

/// 创建带有会话上下文的 span
pub fn create_session_span(session_id: &str, topic: Option<&str>) -> tracing::Span {
    if let Some(topic) = topic {
        tracing::info_span!("session", session_id = %session_id, topic = %topic)
    } else {
        tracing::info_span!("session", session_id = %session_id)
    }
}

/// 创建速记训练 span
pub fn create_drill_span(session_id: &str, terms: usize) -> tracing::Span {
    tracing::info_span!("drill_run", session_id = %session_id, terms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_with_modules() {
        let config = LogConfig::default()
            .with_log_level("info")
            .with_module_level("lingoflow_llm", "debug")
            .ignore_env();
        let (filter, level) = build_filter(&config).unwrap();
        assert!(filter.to_string().contains("lingoflow_llm=debug"));
        assert_eq!(level, "info,lingoflow_llm=debug");
    }

    #[test]
    fn test_build_filter_rejects_garbage() {
        let config = LogConfig::default()
            .with_log_level("info")
            .with_module_level("lingoflow_llm", "loud")
            .ignore_env();
        assert!(matches!(
            build_filter(&config),
            Err(ObservabilityError::Config { .. })
        ));
    }

    #[test]
    fn test_log_manager_init_once() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig::default()
            .with_log_level("debug")
            .with_directory(dir.path())
            .ignore_env();

        let manager = LogManager::init(config).unwrap();
        assert_eq!(manager.level(), "debug");

        manager.update_level("lingoflow_session=trace").unwrap();
        assert_eq!(manager.level(), "lingoflow_session=trace");
        assert!(manager.update_level("lingoflow=loud").is_err());

        let again = LogManager::init(LogConfig::default());
        assert!(matches!(again, Err(ObservabilityError::Init { .. })));
    }

    #[test]
    fn test_create_spans() {
        let session_span = create_session_span("sess-456", Some("Hydrogen"));
        if let Some(meta) = session_span.metadata() {
            assert_eq!(meta.name(), "session");
        }

        let drill_span = create_drill_span("sess-456", 12);
        if let Some(meta) = drill_span.metadata() {
            assert_eq!(meta.name(), "drill_run");
        }
    }
}
