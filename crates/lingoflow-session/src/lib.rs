//! # LingoFlow Session Storage
//!
//! 会话（笔记本）集合的持久化与生命周期管理。
//!
//! ## 存储结构
//!
//! ```text
//! <base_path>/
//! └── <storage_key>.json     # 整个会话集合，每次变更整体重写
//! ```
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use lingoflow_session::{JsonFileStore, JsonFileStoreConfig, SessionManager};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = JsonFileStore::new(JsonFileStoreConfig::new("~/.lingoflow")).await?;
//!     let manager = SessionManager::init(Arc::new(store)).await?;
//!
//!     let session = manager.create("Offshore wind", vec![], vec![]).await?;
//!     manager.rename(&session.id, "Floating offshore wind").await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod json_storage;
pub mod memory_storage;
pub mod session_manager;
pub mod storage;

// 重新导出主要类型
pub use error::{StorageError, StorageResult};
pub use json_storage::{JsonFileStore, JsonFileStoreConfig};
pub use memory_storage::MemoryStore;
pub use session_manager::{DeleteOutcome, SessionManager};
pub use storage::{SessionStore, DEFAULT_STORAGE_KEY};
