//! LingoFlow Observability Infrastructure
//!
//! 提供统一的日志初始化与常用 span。

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;

pub use config::LogConfig;
pub use error::{ObservabilityError, Result};
pub use logging::{create_drill_span, create_session_span, LogManager};

/// 便捷导入模块
pub mod prelude {
    //! 常用类型的便捷导入

    pub use crate::{LogConfig, LogManager, Result};

    pub use tracing::{debug, error, info, instrument, trace, warn, Span};
}
