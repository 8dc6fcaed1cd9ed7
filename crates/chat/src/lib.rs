//! Conversation layer for docchat.
//!
//! Ties retrieval, prompt assembly and generation together, keeps per-session
//! memory and humanizes the model's answers.

pub mod humanizer;
pub mod memory;
pub mod service;

pub use humanizer::{HumanizerPolicy, Replacement};
pub use memory::{Role, SessionHandle, SessionMemory, SessionMemoryStore, Turn, DEFAULT_HISTORY_WINDOW};
pub use service::{ChatReply, ChatService, ChatSettings, CLEAR_COMMAND, DEFAULT_SESSION_ID, RESET_REPLY};
