//! # JsonFileStore Implementation
//!
//! 将整个会话集合保存为单个 JSON 文档：
//! ```text
//! <base_path>/
//! ├── <storage_key>.json       # 会话集合
//! ├── <storage_key>.json.bak   # 无法解析时移出的旧文件
//! └── <storage_key>.json.1.bak # 再次损坏时的备份，已有备份从不覆盖
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lingoflow_core::Session;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::StorageResult;
use crate::storage::{SessionStore, DEFAULT_STORAGE_KEY};

/// JsonFileStore 配置
#[derive(Debug, Clone)]
pub struct JsonFileStoreConfig {
    /// 存储根目录（支持 `~`）
    pub base_path: PathBuf,
    /// 存储键，决定文件名
    pub storage_key: String,
}

impl JsonFileStoreConfig {
    /// 创建默认配置
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }

    /// 设置存储键
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }
}

impl Default for JsonFileStoreConfig {
    fn default() -> Self {
        Self::new("~/.lingoflow")
    }
}

/// 基于单个 JSON 文件的会话存储
pub struct JsonFileStore {
    config: JsonFileStoreConfig,
    file_path: PathBuf,
}

impl JsonFileStore {
    /// 创建新的 JsonFileStore 实例
    pub async fn new(config: JsonFileStoreConfig) -> StorageResult<Self> {
        let base_path_str = config.base_path.to_string_lossy().to_string();
        let base_path = shellexpand::tilde(&base_path_str);
        let base_path = PathBuf::from(base_path.as_ref());

        fs::create_dir_all(&base_path).await?;

        let file_path = base_path.join(format!("{}.json", config.storage_key));
        info!("JsonFileStore initialized at {:?}", file_path);

        Ok(Self { config, file_path })
    }

    /// 数据文件路径
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// 第一个尚不存在的备份路径: `.json.bak`, `.json.1.bak`, `.json.2.bak` ...
    fn backup_path(&self) -> PathBuf {
        let candidate = |suffix: String| {
            let mut name = self.file_path.as_os_str().to_owned();
            name.push(suffix);
            PathBuf::from(name)
        };
        let mut backup = candidate(".bak".to_string());
        let mut n = 1u32;
        while backup.exists() {
            backup = candidate(format!(".{}.bak", n));
            n += 1;
        }
        backup
    }

    /// 把无法解析的文件移到一边，避免下次写入时覆盖
    async fn quarantine(&self) -> StorageResult<()> {
        let backup = self.backup_path();
        fs::rename(&self.file_path, &backup).await?;
        warn!("Moved unreadable session file to {:?}", backup);
        Ok(())
    }
}

#[async_trait]
impl SessionStore for JsonFileStore {
    async fn load(&self) -> StorageResult<Vec<Session>> {
        if !self.file_path.exists() {
            debug!("No session file at {:?}, starting empty", self.file_path);
            return Ok(Vec::new());
        }

        // 按字节读取，非 UTF-8 内容与其它解析错误一样进入隔离流程
        let content = fs::read(&self.file_path).await?;
        if content.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        match serde_json::from_slice::<Vec<Session>>(&content) {
            Ok(sessions) => {
                info!("Loaded {} sessions", sessions.len());
                Ok(sessions)
            }
            Err(e) => {
                warn!("Load error, starting with an empty collection: {}", e);
                self.quarantine().await?;
                Ok(Vec::new())
            }
        }
    }

    async fn save_all(&self, sessions: &[Session]) -> StorageResult<()> {
        let content = serde_json::to_string_pretty(sessions)?;
        fs::write(&self.file_path, content).await?;
        debug!("Saved {} sessions to {:?}", sessions.len(), self.file_path);
        Ok(())
    }

    fn storage_key(&self) -> &str {
        &self.config.storage_key
    }

    async fn health_check(&self) -> StorageResult<()> {
        if let Some(parent) = self.file_path.parent() {
            fs::metadata(parent).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingoflow_core::Term;
    use tempfile::TempDir;

    async fn store(dir: &TempDir) -> JsonFileStore {
        JsonFileStore::new(JsonFileStoreConfig::new(dir.path()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;
        assert!(store.load().await.unwrap().is_empty());
        assert_eq!(store.storage_key(), "lingoflow_sessions");
        assert!(store.file_path().ends_with("lingoflow_sessions.json"));
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;
        let sessions = vec![
            Session::new("B", vec![], vec![Term::new("x", "叉", "d")]),
            Session::new("A", vec!["one".into()], vec![]),
        ];
        store.save_all(&sessions).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, sessions);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_moved_aside() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;
        std::fs::write(store.file_path(), "{not json").unwrap();

        assert!(store.load().await.unwrap().is_empty());
        assert!(!store.file_path().exists());
        let backup = dir.path().join("lingoflow_sessions.json.bak");
        assert_eq!(std::fs::read_to_string(backup).unwrap(), "{not json");
    }

    #[tokio::test]
    async fn test_invalid_utf8_file_is_moved_aside() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;
        std::fs::write(store.file_path(), [0xff, 0xfe, b'[', b']']).unwrap();

        assert!(store.load().await.unwrap().is_empty());
        assert!(!store.file_path().exists());
        let backup = dir.path().join("lingoflow_sessions.json.bak");
        assert_eq!(std::fs::read(backup).unwrap(), vec![0xff, 0xfe, b'[', b']']);
    }

    #[tokio::test]
    async fn test_repeated_corruption_keeps_every_backup() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;

        std::fs::write(store.file_path(), "{first notebooks").unwrap();
        assert!(store.load().await.unwrap().is_empty());
        std::fs::write(store.file_path(), "{second").unwrap();
        assert!(store.load().await.unwrap().is_empty());
        std::fs::write(store.file_path(), "{third").unwrap();
        assert!(store.load().await.unwrap().is_empty());

        let read = |name: &str| std::fs::read_to_string(dir.path().join(name)).unwrap();
        assert_eq!(read("lingoflow_sessions.json.bak"), "{first notebooks");
        assert_eq!(read("lingoflow_sessions.json.1.bak"), "{second");
        assert_eq!(read("lingoflow_sessions.json.2.bak"), "{third");
    }

    #[tokio::test]
    async fn test_custom_storage_key() {
        let dir = TempDir::new().unwrap();
        let config = JsonFileStoreConfig::new(dir.path()).with_storage_key("work");
        let store = JsonFileStore::new(config).await.unwrap();
        store.save_all(&[]).await.unwrap();
        assert!(dir.path().join("work.json").exists());
        store.health_check().await.unwrap();
    }
}
