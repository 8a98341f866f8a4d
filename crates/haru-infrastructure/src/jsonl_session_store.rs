//! JSONL-backed SessionStore implementation.
//!
//! Directory structure:
//! ```text
//! sessions_dir/
//! ├── session_20261016_140312_123_a8Kz3Q.jsonl
//! └── session_20261016_151902_004_Q81mZr.jsonl
//! ```
//!
//! Each line is one `{"role","content","timestamp"}` record. A file may be
//! empty: it is created the moment the session is, before any turn exists.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use haru_core::session::{
    Role, Session, SessionStore, Turn, default_session_name, derive_session_name,
};
use haru_core::{HaruError, Result};
use rand::Rng;
use rand::distributions::Alphanumeric;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

const LOG_EXTENSION: &str = "jsonl";
const ID_SUFFIX_LEN: usize = 6;

/// Session store keeping one newline-delimited JSON file per session.
///
/// Appends to the same session are serialized through a per-session lock, so
/// concurrent callers on a multi-threaded runtime cannot interleave records.
pub struct JsonlSessionStore {
    sessions_dir: PathBuf,
    append_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl JsonlSessionStore {
    /// Creates a store rooted at `sessions_dir`, creating the directory if needed.
    pub async fn new(sessions_dir: impl AsRef<Path>) -> Result<Self> {
        let sessions_dir = sessions_dir.as_ref().to_path_buf();
        fs::create_dir_all(&sessions_dir).await?;

        Ok(Self {
            sessions_dir,
            append_locks: Mutex::new(HashMap::new()),
        })
    }

    /// Returns the directory holding the session logs.
    pub fn sessions_dir(&self) -> &Path {
        &self.sessions_dir
    }

    fn log_path(&self, session_id: &str) -> Result<PathBuf> {
        validate_session_id(session_id)?;
        Ok(self
            .sessions_dir
            .join(format!("{session_id}.{LOG_EXTENSION}")))
    }

    async fn lock_for(&self, session_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.append_locks.lock().await;
        locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn read_turns(path: &Path) -> Result<Vec<Turn>> {
        let text = match fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut turns = Vec::new();
        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Turn>(line) {
                Ok(turn) => turns.push(turn),
                Err(e) => {
                    tracing::warn!(
                        "[SessionStore] Skipping malformed record {} in {:?}: {}",
                        index + 1,
                        path,
                        e
                    );
                }
            }
        }
        Ok(turns)
    }

    async fn describe(&self, session_id: &str, path: &Path) -> Result<Session> {
        let metadata = fs::metadata(path).await?;
        let modified: DateTime<Utc> = metadata.modified()?.into();
        let created = created_at_from_id(session_id)
            .or_else(|| metadata.created().ok().map(Into::into))
            .unwrap_or(modified);

        let turns = Self::read_turns(path).await?;
        let last_turn_at = turns.last().map(|turn| turn.timestamp);

        Ok(Session {
            id: session_id.to_string(),
            name: derive_session_name(&turns, session_id),
            created_at: created.min(modified),
            modified_at: last_turn_at.map_or(modified, |at| at.max(modified)),
        })
    }
}

#[async_trait]
impl SessionStore for JsonlSessionStore {
    async fn list_sessions(&self) -> Result<Vec<Session>> {
        let mut entries = match fs::read_dir(&self.sessions_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut sessions = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(LOG_EXTENSION) {
                continue;
            }
            let Some(session_id) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if validate_session_id(session_id).is_err() {
                continue;
            }

            match self.describe(session_id, &path).await {
                Ok(session) => sessions.push(session),
                Err(e) => {
                    tracing::warn!("[SessionStore] Failed to read session {}: {}", session_id, e);
                    // Continue loading other sessions
                }
            }
        }

        // Most recently active first; ids embed the creation time, so they
        // break ties in creation order.
        sessions.sort_by(|a, b| {
            b.modified_at
                .cmp(&a.modified_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(sessions)
    }

    async fn create_session(&self) -> Result<Session> {
        loop {
            let created_at = Utc::now();
            let session_id = generate_session_id(created_at);
            let path = self.log_path(&session_id)?;

            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(_) => {
                    tracing::info!("[SessionStore] Created session {}", session_id);
                    return Ok(Session {
                        id: session_id,
                        name: default_session_name(created_at),
                        created_at,
                        modified_at: created_at,
                    });
                }
                // Same millisecond and same random suffix: roll again.
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn get_history(&self, session_id: &str) -> Result<Vec<Turn>> {
        let path = self.log_path(session_id)?;
        Self::read_turns(&path).await
    }

    async fn append_turn(&self, session_id: &str, role: Role, content: &str) -> Result<Turn> {
        let path = self.log_path(session_id)?;
        let turn = Turn::new(role, content);
        let mut line = serde_json::to_string(&turn)?;
        line.push('\n');

        let lock = self.lock_for(session_id).await;
        let _guard = lock.lock().await;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(turn)
    }

    async fn delete_session(&self, session_id: &str) -> Result<bool> {
        let path = self.log_path(session_id)?;

        let lock = self.lock_for(session_id).await;
        let _guard = lock.lock().await;

        let deleted = match fs::remove_file(&path).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };
        drop(_guard);

        // The lock entry stays: a task may still hold it for a pending append.
        if deleted {
            tracing::info!("[SessionStore] Deleted session {}", session_id);
        }
        Ok(deleted)
    }
}

/// Builds `session_<yyyymmdd_hhmmss_mmm>_<random>`.
fn generate_session_id(created_at: DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!(
        "session_{}_{}",
        created_at.format("%Y%m%d_%H%M%S_%3f"),
        suffix
    )
}

/// Reads the creation time embedded in an id made by [`generate_session_id`].
fn created_at_from_id(session_id: &str) -> Option<DateTime<Utc>> {
    let stamp = session_id.strip_prefix("session_")?.get(..19)?;
    NaiveDateTime::parse_from_str(stamp, "%Y%m%d_%H%M%S_%3f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Session ids become file names, so only a safe character set is accepted.
fn validate_session_id(session_id: &str) -> Result<()> {
    let valid = !session_id.is_empty()
        && session_id.len() <= 128
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(HaruError::invalid_argument(format!(
            "invalid session id '{session_id}'"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn store() -> (TempDir, JsonlSessionStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonlSessionStore::new(temp_dir.path().join("sessions"))
            .await
            .unwrap();
        (temp_dir, store)
    }

    #[tokio::test]
    async fn test_create_then_history_is_empty() {
        let (_dir, store) = store().await;

        let session = store.create_session().await.unwrap();

        assert!(session.id.starts_with("session_"));
        assert!(session.name.starts_with("New chat "));
        assert!(store.get_history(&session.id).await.unwrap().is_empty());

        let listed = store.list_sessions().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, session.id);
        // No user turn yet: the name falls back to the raw id.
        assert_eq!(listed[0].name, session.id);
    }

    #[tokio::test]
    async fn test_append_then_history() {
        let (_dir, store) = store().await;
        let session = store.create_session().await.unwrap();

        store
            .append_turn(&session.id, Role::User, "hi")
            .await
            .unwrap();

        let history = store.get_history(&session.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].content, "hi");
    }

    #[tokio::test]
    async fn test_history_preserves_append_order() {
        let (_dir, store) = store().await;
        let session = store.create_session().await.unwrap();

        for (i, role) in [Role::User, Role::Assistant, Role::User].into_iter().enumerate() {
            store
                .append_turn(&session.id, role, &format!("turn {i}"))
                .await
                .unwrap();
        }

        let contents: Vec<_> = store
            .get_history(&session.id)
            .await
            .unwrap()
            .into_iter()
            .map(|turn| turn.content)
            .collect();
        assert_eq!(contents, vec!["turn 0", "turn 1", "turn 2"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_do_not_interleave() {
        let (_dir, store) = store().await;
        let store = Arc::new(store);
        let session = store.create_session().await.unwrap();
        let long = "x".repeat(64 * 1024);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let id = session.id.clone();
            let content = long.clone();
            handles.push(tokio::spawn(async move {
                store.append_turn(&id, Role::User, &content).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let history = store.get_history(&session.id).await.unwrap();
        assert_eq!(history.len(), 8);
        assert!(history.iter().all(|turn| turn.content.len() == long.len()));
    }

    #[tokio::test]
    async fn test_missing_session_history_is_empty() {
        let (_dir, store) = store().await;
        assert!(store.get_history("does-not-exist").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_semantics() {
        let (_dir, store) = store().await;
        assert!(!store.delete_session("does-not-exist").await.unwrap());

        let session = store.create_session().await.unwrap();
        store
            .append_turn(&session.id, Role::User, "hello")
            .await
            .unwrap();

        assert!(store.delete_session(&session.id).await.unwrap());
        assert!(store.get_history(&session.id).await.unwrap().is_empty());
        assert!(!store.delete_session(&session.id).await.unwrap());
        assert!(store.list_sessions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_orders_by_most_recent_append() {
        let (_dir, store) = store().await;
        let first = store.create_session().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let second = store.create_session().await.unwrap();

        let listed = store.list_sessions().await.unwrap();
        assert_eq!(listed[0].id, second.id);

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        store
            .append_turn(&first.id, Role::User, "back to the first one")
            .await
            .unwrap();

        let listed = store.list_sessions().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, first.id);
        assert_eq!(listed[0].name, "back to the first on...");
        assert_eq!(listed[1].id, second.id);
    }

    #[tokio::test]
    async fn test_created_at_comes_from_id_not_appends() {
        let (_dir, store) = store().await;
        let session = store.create_session().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        store
            .append_turn(&session.id, Role::User, "later")
            .await
            .unwrap();

        let listed = store.list_sessions().await.unwrap();

        assert_eq!(
            listed[0].created_at.timestamp_millis(),
            session.created_at.timestamp_millis()
        );
        assert!(listed[0].modified_at > listed[0].created_at);
    }

    #[test]
    fn test_created_at_from_id() {
        let parsed = created_at_from_id("session_20261016_140312_123_a8Kz3Q").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2026-10-16T14:03:12.123+00:00");

        assert!(created_at_from_id("imported-chat").is_none());
        assert!(created_at_from_id("session_short").is_none());
    }

    #[tokio::test]
    async fn test_delete_keeps_append_lock_shared() {
        let (_dir, store) = store().await;
        let session = store.create_session().await.unwrap();
        let held = store.lock_for(&session.id).await;

        assert!(store.delete_session(&session.id).await.unwrap());

        let after = store.lock_for(&session.id).await;
        assert!(Arc::ptr_eq(&held, &after));
    }

    #[tokio::test]
    async fn test_malformed_lines_are_skipped() {
        let (_dir, store) = store().await;
        let session = store.create_session().await.unwrap();
        store
            .append_turn(&session.id, Role::User, "kept")
            .await
            .unwrap();

        let path = store.sessions_dir().join(format!("{}.jsonl", session.id));
        let mut text = std::fs::read_to_string(&path).unwrap();
        text.push_str("{not json}\n");
        std::fs::write(&path, text).unwrap();

        let history = store.get_history(&session.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content, "kept");
    }

    #[tokio::test]
    async fn test_rejects_path_like_ids() {
        let (_dir, store) = store().await;
        assert!(store.get_history("../config").await.is_err());
        assert!(store.append_turn("a/b", Role::User, "x").await.is_err());
        assert!(store.delete_session("").await.is_err());
    }

    #[test]
    fn test_generated_ids_are_unique_and_valid() {
        let now = Utc::now();
        let a = generate_session_id(now);
        let b = generate_session_id(now);
        assert_ne!(a, b);
        assert!(validate_session_id(&a).is_ok());
    }
}
