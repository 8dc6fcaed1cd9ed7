//! Per-session conversation memory.
//!
//! The store maps session ids to transcripts. Each session sits behind its own
//! async mutex so one conversation can be held for a whole request while other
//! sessions proceed independently.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Turns kept per session unless configured otherwise.
pub const DEFAULT_HISTORY_WINDOW: usize = 20;

/// Who said a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Transcript prefix.
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "Pengguna",
            Role::Assistant => "Asisten",
        }
    }
}

/// One utterance in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

/// Ordered transcript of one session.
#[derive(Debug, Clone)]
pub struct SessionMemory {
    session_id: String,
    turns: VecDeque<Turn>,
    /// Maximum turns retained (0 = unbounded)
    window: usize,
}

impl SessionMemory {
    pub fn new(session_id: impl Into<String>, window: usize) -> Self {
        Self {
            session_id: session_id.into(),
            turns: VecDeque::new(),
            window,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Append a turn, dropping the oldest turns beyond the window.
    ///
    /// The retained transcript never starts with an assistant turn, so an
    /// evicted question takes its answer with it.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push_back(turn);
        if self.window == 0 || self.turns.len() <= self.window {
            return;
        }

        while self.turns.len() > self.window {
            self.turns.pop_front();
        }
        while self
            .turns
            .front()
            .is_some_and(|turn| turn.role == Role::Assistant)
        {
            self.turns.pop_front();
        }
    }

    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Transcript text, one `Label: text` line per turn, oldest first.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|turn| format!("{}: {}", turn.role.label(), turn.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Shared handle to one session's memory.
pub type SessionHandle = Arc<Mutex<SessionMemory>>;

/// Process-wide registry of session memories.
#[derive(Debug)]
pub struct SessionMemoryStore {
    sessions: DashMap<String, SessionHandle>,
    history_window: usize,
}

impl SessionMemoryStore {
    pub fn new(history_window: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            history_window,
        }
    }

    /// Handle to the session's memory, creating an empty one on first use.
    pub fn get_or_create(&self, session_id: &str) -> SessionHandle {
        if let Some(existing) = self.sessions.get(session_id) {
            return Arc::clone(existing.value());
        }

        let handle = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                tracing::debug!("Creating memory for session '{}'", session_id);
                Arc::new(Mutex::new(SessionMemory::new(
                    session_id,
                    self.history_window,
                )))
            });
        Arc::clone(handle.value())
    }

    pub async fn append_turn(&self, session_id: &str, turn: Turn) {
        let handle = self.get_or_create(session_id);
        handle.lock().await.append(turn);
    }

    /// Transcript of the session; empty when it does not exist.
    pub async fn render(&self, session_id: &str) -> String {
        match self.handle(session_id) {
            Some(handle) => handle.lock().await.render(),
            None => String::new(),
        }
    }

    /// Remove the session. Returns whether it existed.
    pub fn clear(&self, session_id: &str) -> bool {
        let removed = self.sessions.remove(session_id).is_some();
        tracing::debug!("Cleared session '{}' (existed: {})", session_id, removed);
        removed
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Turns held for the session (0 when it does not exist).
    pub async fn len(&self, session_id: &str) -> usize {
        match self.handle(session_id) {
            Some(handle) => handle.lock().await.len(),
            None => 0,
        }
    }

    fn handle(&self, session_id: &str) -> Option<SessionHandle> {
        self.sessions
            .get(session_id)
            .map(|entry| Arc::clone(entry.value()))
    }
}

impl Default for SessionMemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_WINDOW)
    }
}
