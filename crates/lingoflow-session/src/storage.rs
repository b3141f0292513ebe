//! # Storage Traits
//!
//! 会话集合的持久化抽象：启动时读取一次，每次变更后整体重写。

use async_trait::async_trait;
use lingoflow_core::Session;

use crate::error::StorageResult;

/// 默认存储键
pub const DEFAULT_STORAGE_KEY: &str = "lingoflow_sessions";

/// 会话集合存储 trait
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// 读取整个会话集合（按最近创建排序）
    async fn load(&self) -> StorageResult<Vec<Session>>;

    /// 整体覆盖写入会话集合
    async fn save_all(&self, sessions: &[Session]) -> StorageResult<()>;

    /// 存储键
    fn storage_key(&self) -> &str;

    /// 健康检查
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}
