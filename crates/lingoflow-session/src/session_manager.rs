//! # Session Manager
//!
//! 会话生命周期管理：创建、打开、重命名、更新、删除、导入导出。
//!
//! 所有变更都经过这里的单写入者 API，变更后整体重写会话集合。
//! 锁只在内存修改时持有，写入存储前先复制快照，不跨越 await 持锁。

use std::sync::Arc;

use chrono::{DateTime, Local};
use lingoflow_core::{
    export_package, import_package, Confirmer, PrepMaterial, Session, SessionId, Term,
};
use parking_lot::RwLock;
use tracing::{debug, error, info, warn};

use crate::error::{StorageError, StorageResult};
use crate::storage::SessionStore;

/// 删除操作结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// 用户取消，未做任何修改
    Declined,
    /// 已删除；`cleared_active` 表示是否清除了当前活动会话
    Deleted { cleared_active: bool },
}

#[derive(Debug, Default)]
struct ManagerState {
    /// 会话集合，最新创建的在前
    sessions: Vec<Session>,
    /// 当前活动会话
    active: Option<SessionId>,
}

impl ManagerState {
    fn position(&self, id: &str) -> Option<usize> {
        self.sessions.iter().position(|s| s.id == id)
    }

    fn get_mut(&mut self, id: &str) -> StorageResult<&mut Session> {
        self.sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| StorageError::not_found(id))
    }
}

/// SessionManager
///
/// 持有会话集合和活动选择，所有修改立即持久化。
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    state: RwLock<ManagerState>,
}

impl SessionManager {
    /// 启动时读取一次存储
    pub async fn init(store: Arc<dyn SessionStore>) -> StorageResult<Self> {
        let sessions = store.load().await?;
        info!(
            "SessionManager initialized with {} sessions (key: {})",
            sessions.len(),
            store.storage_key()
        );
        Ok(Self {
            store,
            state: RwLock::new(ManagerState {
                sessions,
                active: None,
            }),
        })
    }

    /// 整体重写会话集合
    async fn persist(&self) -> StorageResult<()> {
        let snapshot = self.state.read().sessions.clone();
        self.store.save_all(&snapshot).await
    }

    /// 创建新会话并设为活动会话
    pub async fn create(
        &self,
        topic: impl Into<String>,
        summary: Vec<String>,
        terms: Vec<Term>,
    ) -> StorageResult<Session> {
        let session = Session::new(topic, summary, terms);
        {
            let mut state = self.state.write();
            state.sessions.insert(0, session.clone());
            state.active = Some(session.id.clone());
        }
        self.persist().await?;

        info!(
            "Created session {} '{}' with {} terms",
            session.id,
            session.topic,
            session.terms.len()
        );
        Ok(session)
    }

    /// 用备课材料创建会话
    pub async fn create_from_prep(
        &self,
        topic: &str,
        material: PrepMaterial,
    ) -> StorageResult<Session> {
        let (summary, terms) = material.into_parts(topic);
        self.create(topic, summary, terms).await
    }

    pub fn get(&self, id: &str) -> Option<Session> {
        let state = self.state.read();
        state.sessions.iter().find(|s| s.id == id).cloned()
    }

    /// 全部会话，最新创建的在前
    pub fn list(&self) -> Vec<Session> {
        self.state.read().sessions.clone()
    }

    pub fn len(&self) -> usize {
        self.state.read().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 按唯一 ID 前缀查找会话
    pub fn resolve(&self, prefix: &str) -> StorageResult<Session> {
        let prefix = prefix.trim();
        let state = self.state.read();
        if let Some(exact) = state.sessions.iter().find(|s| s.id == prefix) {
            return Ok(exact.clone());
        }
        let matches: Vec<&Session> = state
            .sessions
            .iter()
            .filter(|s| !prefix.is_empty() && s.id.starts_with(prefix))
            .collect();
        match matches.as_slice() {
            [single] => Ok((*single).clone()),
            [] => Err(StorageError::not_found(prefix)),
            many => Err(StorageError::AmbiguousId {
                prefix: prefix.to_string(),
                count: many.len(),
            }),
        }
    }

    /// 打开会话（设为活动会话）
    pub fn open(&self, id: &str) -> StorageResult<Session> {
        let mut state = self.state.write();
        let session = state
            .sessions
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| StorageError::not_found(id))?;
        state.active = Some(session.id.clone());
        debug!("Opened session {}", id);
        Ok(session)
    }

    /// 当前活动会话
    pub fn active(&self) -> Option<Session> {
        let state = self.state.read();
        let id = state.active.as_ref()?;
        state.sessions.iter().find(|s| &s.id == id).cloned()
    }

    pub fn active_id(&self) -> Option<SessionId> {
        self.state.read().active.clone()
    }

    /// 关闭活动会话，回到列表视图
    pub fn close(&self) {
        self.state.write().active = None;
    }

    /// 按 ID 替换会话。调用方负责更新 `last_modified`。
    ///
    /// ID 不存在时不做修改并返回 `false`，这是调用方的逻辑错误。
    pub async fn update(&self, session: Session) -> StorageResult<bool> {
        {
            let mut state = self.state.write();
            match state.position(&session.id) {
                Some(index) => state.sessions[index] = session.clone(),
                None => {
                    error!("update called for unknown session {}", session.id);
                    return Ok(false);
                }
            }
        }
        self.persist().await?;
        debug!("Updated session {}", session.id);
        Ok(true)
    }

    /// 重命名；去除首尾空白后为空则不做修改
    pub async fn rename(&self, id: &str, new_topic: &str) -> StorageResult<bool> {
        let topic = new_topic.trim();
        if topic.is_empty() {
            debug!("Ignoring blank rename for session {}", id);
            return Ok(false);
        }
        self.state.write().get_mut(id)?.rename(topic);
        self.persist().await?;
        info!("Renamed session {} to '{}'", id, topic);
        Ok(true)
    }

    /// 保存笔记；内容未变化时不写入
    pub async fn set_notes(&self, id: &str, notes: &str) -> StorageResult<bool> {
        {
            let mut state = self.state.write();
            let session = state.get_mut(id)?;
            if session.notes == notes {
                return Ok(false);
            }
            session.set_notes(notes);
        }
        self.persist().await?;
        debug!("Saved notes for session {}", id);
        Ok(true)
    }

    /// 追加带时间戳的笔记片段
    pub async fn capture_note(
        &self,
        id: &str,
        snippet: &str,
        at: DateTime<Local>,
    ) -> StorageResult<bool> {
        let snippet = snippet.trim();
        if snippet.is_empty() {
            return Ok(false);
        }
        self.state.write().get_mut(id)?.capture_note(snippet, at);
        self.persist().await?;
        debug!("Captured note into session {}", id);
        Ok(true)
    }

    /// 删除会话，需要用户确认
    pub async fn delete(
        &self,
        id: &str,
        confirmer: &dyn Confirmer,
    ) -> StorageResult<DeleteOutcome> {
        let topic = self
            .get(id)
            .map(|s| s.topic)
            .ok_or_else(|| StorageError::not_found(id))?;

        if !confirmer.confirm(&format!("Delete notebook \"{}\"?", topic)) {
            debug!("Deletion of session {} declined", id);
            return Ok(DeleteOutcome::Declined);
        }

        let cleared_active = {
            let mut state = self.state.write();
            state.sessions.retain(|s| s.id != id);
            if state.active.as_deref() == Some(id) {
                state.active = None;
                true
            } else {
                false
            }
        };
        self.persist().await?;

        info!("Deleted session {}", id);
        Ok(DeleteOutcome::Deleted { cleared_active })
    }

    /// 导出完整会话（格式化 JSON）
    pub fn export(&self, session: &Session) -> StorageResult<String> {
        Ok(export_package(session)?)
    }

    /// 导入会话包；ID 冲突时分配新 ID
    pub async fn import(&self, json: &str) -> StorageResult<Session> {
        let mut session = import_package(json)?;
        {
            let mut state = self.state.write();
            if state.position(&session.id).is_some() {
                let fresh = uuid::Uuid::new_v4().to_string();
                warn!(
                    "Imported session id {} already exists, assigning {}",
                    session.id, fresh
                );
                session.id = fresh;
            }
            state.sessions.insert(0, session.clone());
        }
        self.persist().await?;
        info!("Imported session {} '{}'", session.id, session.topic);
        Ok(session)
    }

    /// 存储键
    pub fn storage_key(&self) -> &str {
        self.store.storage_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_storage::MemoryStore;
    use lingoflow_core::{AutoConfirm, RawTerm};

    async fn manager() -> (SessionManager, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let manager = SessionManager::init(store.clone()).await.unwrap();
        (manager, store)
    }

    #[tokio::test]
    async fn test_create_prepends_and_activates() {
        let (manager, store) = manager().await;
        let first = manager.create("First", vec![], vec![]).await.unwrap();
        let second = manager.create("Second", vec![], vec![]).await.unwrap();

        let list = manager.list();
        assert_eq!(list[0].id, second.id);
        assert_eq!(list[1].id, first.id);
        assert_eq!(manager.active_id(), Some(second.id));
        assert!(second.notes.is_empty());
        assert!(second.chat_history.is_empty());
        assert_eq!(second.created_at, second.last_modified);
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn test_ids_stay_unique() {
        let (manager, _) = manager().await;
        for i in 0..20 {
            manager.create(format!("t{}", i), vec![], vec![]).await.unwrap();
        }
        let mut ids: Vec<_> = manager.list().into_iter().map(|s| s.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 20);
    }

    #[tokio::test]
    async fn test_create_from_prep_wraps_terms() {
        let (manager, _) = manager().await;
        let material = PrepMaterial::new(
            vec!["point".into()],
            vec![RawTerm {
                english: "tariff".into(),
                chinese: "关税".into(),
                definition: "Tax on imports".into(),
            }],
        );
        let session = manager.create_from_prep("Trade", material).await.unwrap();
        assert_eq!(session.terms[0].tags, vec!["Trade".to_string()]);
        assert_eq!(session.terms[0].mastery_level, 0);
        assert_eq!(session.summary, vec!["point".to_string()]);
    }

    #[tokio::test]
    async fn test_blank_rename_is_ignored() {
        let (manager, store) = manager().await;
        let session = manager.create("Original", vec![], vec![]).await.unwrap();

        assert!(!manager.rename(&session.id, "   \t").await.unwrap());
        assert_eq!(manager.get(&session.id).unwrap().topic, "Original");
        assert_eq!(store.write_count(), 1);

        assert!(manager.rename(&session.id, "  Renamed ").await.unwrap());
        assert_eq!(manager.get(&session.id).unwrap().topic, "Renamed");
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_noop() {
        let (manager, store) = manager().await;
        manager.create("Known", vec![], vec![]).await.unwrap();
        let stray = Session::new("Stray", vec![], vec![]);

        assert!(!manager.update(stray).await.unwrap());
        assert_eq!(manager.len(), 1);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_update_replaces_by_id() {
        let (manager, _) = manager().await;
        let mut session = manager.create("Topic", vec![], vec![]).await.unwrap();
        session.prepend_term(Term::manual("Topic"));

        assert!(manager.update(session.clone()).await.unwrap());
        assert_eq!(manager.get(&session.id).unwrap().terms.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_active_clears_selection() {
        let (manager, _) = manager().await;
        let other = manager.create("Other", vec![], vec![]).await.unwrap();
        let active = manager.create("Active", vec![], vec![]).await.unwrap();

        let outcome = manager.delete(&other.id, &AutoConfirm::yes()).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::Deleted { cleared_active: false });
        assert_eq!(manager.active_id(), Some(active.id.clone()));

        let outcome = manager.delete(&active.id, &AutoConfirm::yes()).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::Deleted { cleared_active: true });
        assert!(manager.active().is_none());
        assert!(manager.is_empty());
    }

    #[tokio::test]
    async fn test_open_and_close_active() {
        let (manager, store) = manager().await;
        let first = manager.create("First", vec![], vec![]).await.unwrap();
        manager.create("Second", vec![], vec![]).await.unwrap();
        let writes = store.write_count();

        let opened = manager.open(&first.id).unwrap();
        assert_eq!(opened.id, first.id);
        assert_eq!(manager.active_id(), Some(first.id.clone()));

        manager.close();
        assert!(manager.active().is_none());
        assert_eq!(manager.len(), 2);
        assert_eq!(store.write_count(), writes);
    }

    #[tokio::test]
    async fn test_declined_delete_changes_nothing() {
        let (manager, store) = manager().await;
        let session = manager.create("Keep", vec![], vec![]).await.unwrap();

        let outcome = manager.delete(&session.id, &AutoConfirm::no()).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::Declined);
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.active_id(), Some(session.id));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_notes_save_only_on_change() {
        let (manager, store) = manager().await;
        let session = manager.create("Notes", vec![], vec![]).await.unwrap();

        assert!(manager.set_notes(&session.id, "draft").await.unwrap());
        assert!(!manager.set_notes(&session.id, "draft").await.unwrap());
        assert_eq!(store.write_count(), 2);

        let at = chrono::TimeZone::with_ymd_and_hms(&Local, 2024, 3, 2, 14, 5, 9).unwrap();
        assert!(manager.capture_note(&session.id, "quote", at).await.unwrap());
        assert_eq!(
            manager.get(&session.id).unwrap().notes,
            "draft\n\n[14:05:09] quote"
        );
    }

    #[tokio::test]
    async fn test_resolve_by_prefix() {
        let (manager, _) = manager().await;
        let session = manager.create("Prefix", vec![], vec![]).await.unwrap();

        let found = manager.resolve(&session.id[..8]).unwrap();
        assert_eq!(found.id, session.id);
        assert!(matches!(
            manager.resolve("zzzz"),
            Err(StorageError::SessionNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_import_assigns_fresh_id_on_collision() {
        let (manager, _) = manager().await;
        let session = manager.create("Backup", vec![], vec![]).await.unwrap();
        let json = manager.export(&session).unwrap();

        let imported = manager.import(&json).await.unwrap();
        assert_ne!(imported.id, session.id);
        assert_eq!(imported.topic, "Backup");
        assert_eq!(manager.list()[0].id, imported.id);
        assert_eq!(manager.len(), 2);
    }

    #[tokio::test]
    async fn test_reload_from_store() {
        let store = Arc::new(MemoryStore::new());
        let manager = SessionManager::init(store.clone()).await.unwrap();
        let session = manager.create("Persisted", vec![], vec![]).await.unwrap();
        drop(manager);

        let reopened = SessionManager::init(store).await.unwrap();
        assert_eq!(reopened.get(&session.id), Some(session));
        assert!(reopened.active().is_none());
    }
}
