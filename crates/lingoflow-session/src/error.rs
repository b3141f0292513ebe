//! # Storage Error Types
//!
//! 会话存储与生命周期管理相关的错误类型。

use thiserror::Error;

/// 存储错误类型
#[derive(Error, Debug)]
pub enum StorageError {
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 序列化/反序列化错误
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 会话不存在
    #[error("Session not found: {id}")]
    SessionNotFound { id: String },

    /// ID 前缀匹配到多个会话
    #[error("Ambiguous session id '{prefix}' matches {count} sessions")]
    AmbiguousId { prefix: String, count: usize },

    /// 配置错误
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// 其他错误
    #[error("Storage error: {message}")]
    Other { message: String },
}

impl StorageError {
    /// 创建其他错误
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// 创建配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// 会话不存在
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::SessionNotFound { id: id.into() }
    }
}

/// 存储结果类型
pub type StorageResult<T> = Result<T, StorageError>;
