//! In-memory session transcripts.
//!
//! The [`HistoryStore`] is the sole owner of conversation state: an ordered
//! transcript per session key, growing monotonically for the life of the
//! process. There is no delete and no trimming; the full transcript is the
//! prompt context for every generation call.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Assistant => f.write_str("assistant"),
        }
    }
}

/// One message within a session's transcript. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Process-wide mapping from session ID to its ordered transcript.
///
/// Cheap to clone; all clones share the same map. Each call takes the lock
/// once, so an append is atomic and per-session insertion order is preserved
/// even under concurrent requests.
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    sessions: Arc<RwLock<HashMap<String, Vec<Turn>>>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the session's transcript, creating an empty one
    /// for unknown session IDs.
    ///
    /// Known sessions are served under the read lock; only a genuinely new
    /// session takes the write lock to insert its empty transcript.
    pub async fn get_or_create(&self, session_id: &str) -> Vec<Turn> {
        if let Some(turns) = self.sessions.read().await.get(session_id) {
            return turns.clone();
        }
        self.sessions
            .write()
            .await
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }

    /// Returns a snapshot of the session's transcript without creating one:
    /// probing an unknown session ID yields an empty snapshot and leaves the
    /// store untouched.
    pub async fn get(&self, session_id: &str) -> Vec<Turn> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Appends a turn to the session's transcript, preserving order.
    pub async fn append(&self, session_id: &str, turn: Turn) {
        self.sessions
            .write()
            .await
            .entry(session_id.to_string())
            .or_default()
            .push(turn);
    }

    /// Number of turns recorded for a session (0 for unknown sessions).
    pub async fn len(&self, session_id: &str) -> usize {
        self.sessions
            .read()
            .await
            .get(session_id)
            .map_or(0, Vec::len)
    }

    /// Number of sessions currently tracked.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Serializes a transcript for the language model: one `"role: content"`
/// line per turn, oldest first, newline separated. The model is stateless
/// between calls, so this string carries all context.
pub fn render_prompt(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|t| format!("{}: {}", t.role, t.content))
        .collect::<Vec<_>>()
        .join("\n")
}
