//! Per-thread checkpoints so a suspended turn can be resumed later.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decision::ToolCallRequest;
use crate::error::{MailgateError, Result};
use crate::session::{ConversationState, ThreadId, Turn};

/// Runtime-side memory of one thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub thread_id: ThreadId,
    #[serde(default)]
    pub transcript: Vec<Turn>,
    /// Tool call the thread is suspended on, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<ToolCallRequest>,
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(thread_id: ThreadId) -> Self {
        Self {
            thread_id,
            transcript: Vec::new(),
            pending: None,
            updated_at: Utc::now(),
        }
    }

    /// Session-side view of this thread.
    pub fn into_conversation(self) -> ConversationState {
        ConversationState::restore(self.thread_id, self.transcript, self.pending)
    }
}

/// Storage abstraction for thread checkpoints.
pub trait Checkpointer: Send + Sync {
    fn load(&self, thread_id: &ThreadId) -> Result<Option<Checkpoint>>;
    fn save(&self, checkpoint: &Checkpoint) -> Result<()>;
    fn clear(&self, thread_id: &ThreadId) -> Result<()>;
}

/// Process-local checkpoints; lost when the process exits.
#[derive(Debug, Default)]
pub struct InMemoryCheckpointer {
    threads: Mutex<HashMap<ThreadId, Checkpoint>>,
}

impl InMemoryCheckpointer {
    pub fn new() -> Self {
        Self::default()
    }

    fn threads(&self) -> Result<std::sync::MutexGuard<'_, HashMap<ThreadId, Checkpoint>>> {
        self.threads
            .lock()
            .map_err(|_| MailgateError::runtime("checkpoint store lock poisoned"))
    }
}

impl Checkpointer for InMemoryCheckpointer {
    fn load(&self, thread_id: &ThreadId) -> Result<Option<Checkpoint>> {
        Ok(self.threads()?.get(thread_id).cloned())
    }

    fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        self.threads()?
            .insert(checkpoint.thread_id.clone(), checkpoint.clone());
        Ok(())
    }

    fn clear(&self, thread_id: &ThreadId) -> Result<()> {
        self.threads()?.remove(thread_id);
        Ok(())
    }
}

/// File-backed checkpoints: one JSON file per thread.
///
/// # Example
/// ```no_run
/// use mailgate::runtime::{Checkpoint, Checkpointer, FileCheckpointer};
/// use mailgate::session::ThreadId;
///
/// let store = FileCheckpointer::new_default();
/// store.save(&Checkpoint::new(ThreadId::from("demo")))?;
/// # Ok::<(), mailgate::error::MailgateError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileCheckpointer {
    base_dir: PathBuf,
}

impl FileCheckpointer {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn new_default() -> Self {
        Self::new(default_checkpoint_dir())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn checkpoint_path(&self, thread_id: &ThreadId) -> PathBuf {
        self.base_dir
            .join(format!("{}.json", file_stem(thread_id.as_str())))
    }
}

impl Checkpointer for FileCheckpointer {
    fn load(&self, thread_id: &ThreadId) -> Result<Option<Checkpoint>> {
        let path = self.checkpoint_path(thread_id);
        let raw = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let file: CheckpointFile = serde_json::from_str(&raw)?;
        if file.version != CHECKPOINT_VERSION {
            return Err(MailgateError::runtime(format!(
                "unsupported checkpoint version {} in {}",
                file.version,
                path.display()
            )));
        }
        if file.checkpoint.thread_id != *thread_id {
            return Err(MailgateError::runtime(format!(
                "{} holds thread {}, not {thread_id}",
                path.display(),
                file.checkpoint.thread_id
            )));
        }
        Ok(Some(file.checkpoint))
    }

    fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        let path = self.checkpoint_path(&checkpoint.thread_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = CheckpointFile {
            version: CHECKPOINT_VERSION,
            checkpoint: checkpoint.clone(),
            saved_at: Utc::now(),
        };
        fs::write(&path, serde_json::to_string_pretty(&file)?)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }
        tracing::debug!(
            thread_id = %checkpoint.thread_id,
            path = %path.display(),
            "checkpoint saved"
        );
        Ok(())
    }

    fn clear(&self, thread_id: &ThreadId) -> Result<()> {
        match fs::remove_file(self.checkpoint_path(thread_id)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

const CHECKPOINT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CheckpointFile {
    version: u32,
    checkpoint: Checkpoint,
    saved_at: DateTime<Utc>,
}

/// `~/.mailgate/checkpoints`, or a relative fallback without a home directory.
pub fn default_checkpoint_dir() -> PathBuf {
    crate::config::default_mailgate_dir().join("checkpoints")
}

/// File stem for a thread id: one stem per id, and every stem names a single id.
///
/// Lowercase letters, digits and `-` are kept; every other byte becomes `_XX`
/// (uppercase hex), so ids differing only in case or punctuation never share
/// a file, even on case-insensitive filesystems. The empty id maps to `_`.
fn file_stem(thread_id: &str) -> String {
    if thread_id.is_empty() {
        return "_".to_string();
    }
    let mut stem = String::with_capacity(thread_id.len());
    for byte in thread_id.bytes() {
        if byte.is_ascii_lowercase() || byte.is_ascii_digit() || byte == b'-' {
            stem.push(char::from(byte));
        } else {
            stem.push_str(&format!("_{byte:02X}"));
        }
    }
    stem
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolArgs;
    use tempfile::TempDir;

    fn suspended_checkpoint(thread: &str) -> Checkpoint {
        let mut checkpoint = Checkpoint::new(ThreadId::from(thread));
        checkpoint.transcript.push(Turn::user("email a@x.com"));
        checkpoint.pending =
            Some(ToolCallRequest::new("send_email", ToolArgs::new()).with_id("call-1"));
        checkpoint
    }

    #[test]
    fn file_store_persists_pending_call() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointer::new(dir.path());
        let checkpoint = suspended_checkpoint("thread-1");

        store.save(&checkpoint).unwrap();
        let loaded = store.load(&checkpoint.thread_id).unwrap().unwrap();

        assert_eq!(loaded, checkpoint);
    }

    #[test]
    fn restored_conversation_awaits_decision() {
        let state = suspended_checkpoint("thread-3").into_conversation();

        assert_eq!(state.thread_id().as_str(), "thread-3");
        assert_eq!(state.history().len(), 1);
        assert!(state.approval_state().is_awaiting_decision());
        assert_eq!(state.pending().map(|call| call.id.as_str()), Some("call-1"));
    }

    #[test]
    fn file_store_clear_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointer::new(dir.path());
        let checkpoint = suspended_checkpoint("thread-2");
        store.save(&checkpoint).unwrap();

        store.clear(&checkpoint.thread_id).unwrap();
        store.clear(&checkpoint.thread_id).unwrap();

        assert!(store.load(&checkpoint.thread_id).unwrap().is_none());
    }

    #[test]
    fn file_store_rejects_unknown_version() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointer::new(dir.path());
        let checkpoint = suspended_checkpoint("thread-3");
        store.save(&checkpoint).unwrap();

        let path = dir.path().join("thread-3.json");
        let raw = fs::read_to_string(&path)
            .unwrap()
            .replace("\"version\": 1", "\"version\": 9");
        fs::write(&path, raw).unwrap();

        assert!(matches!(store.load(&checkpoint.thread_id), Err(MailgateError::Runtime(_))));
    }

    #[test]
    fn in_memory_store_keeps_threads_apart() {
        let store = InMemoryCheckpointer::new();
        store.save(&suspended_checkpoint("a")).unwrap();

        assert!(store.load(&ThreadId::from("a")).unwrap().is_some());
        assert!(store.load(&ThreadId::from("b")).unwrap().is_none());
    }

    #[test]
    fn file_stems_are_safe_and_distinct() {
        assert_eq!(file_stem("550e8400-e29b"), "550e8400-e29b");
        assert_eq!(file_stem("../etc/passwd"), "_2E_2E_2Fetc_2Fpasswd");
        assert_eq!(file_stem("Team.Budget"), "_54eam_2E_42udget");
        assert_eq!(file_stem(""), "_");
        assert_ne!(file_stem("Team.Budget"), file_stem("team-budget"));
        assert_ne!(file_stem("a_2E"), file_stem("a."));
    }

    #[test]
    fn similar_thread_ids_do_not_share_a_checkpoint() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointer::new(dir.path());
        store.save(&suspended_checkpoint("Team.Budget")).unwrap();

        assert!(store.load(&ThreadId::from("team-budget")).unwrap().is_none());
        assert!(store.load(&ThreadId::from("team.budget")).unwrap().is_none());
        let loaded = store.load(&ThreadId::from("Team.Budget")).unwrap().unwrap();
        assert_eq!(loaded.thread_id.as_str(), "Team.Budget");
    }

    #[test]
    fn file_holding_another_thread_is_refused() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointer::new(dir.path());
        store.save(&suspended_checkpoint("thread-a")).unwrap();
        fs::rename(dir.path().join("thread-a.json"), dir.path().join("thread-b.json")).unwrap();

        let err = store.load(&ThreadId::from("thread-b")).unwrap_err();
        assert!(matches!(err, MailgateError::Runtime(_)), "{err}");
    }
}
