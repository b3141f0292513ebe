//! # MemoryStore
//!
//! 内存中的会话存储，序列化为 JSON 保存在单个槽位中，用于测试和临时运行。

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use lingoflow_core::Session;
use parking_lot::RwLock;

use crate::error::StorageResult;
use crate::storage::{SessionStore, DEFAULT_STORAGE_KEY};

/// 内存会话存储
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: RwLock<Option<String>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置会话集合
    pub fn with_sessions(sessions: &[Session]) -> StorageResult<Self> {
        let store = Self::new();
        *store.slot.write() = Some(serde_json::to_string(sessions)?);
        Ok(store)
    }

    /// 写入次数
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// 当前槽位中的原始 JSON
    pub fn raw(&self) -> Option<String> {
        self.slot.read().clone()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load(&self) -> StorageResult<Vec<Session>> {
        let raw = self.slot.read().clone();
        match raw {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    async fn save_all(&self, sessions: &[Session]) -> StorageResult<()> {
        let json = serde_json::to_string(sessions)?;
        *self.slot.write() = Some(json);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn storage_key(&self) -> &str {
        DEFAULT_STORAGE_KEY
    }
}
