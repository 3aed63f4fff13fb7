//! Per-session conversation state
//!
//! A checkpoint is the history the model sees plus, when the last pass stopped
//! on interruptions, the tool-call batch waiting for decisions.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool call requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub call_id: String,
    /// Model-facing tool name
    pub name: String,
    pub arguments: Value,
}

/// History entry, in model order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ConversationMessage {
    User {
        content: String,
    },
    Assistant {
        content: Option<String>,
        #[serde(default)]
        tool_calls: Vec<ToolCallRequest>,
    },
    Tool {
        call_id: String,
        name: String,
        content: String,
    },
}

impl ConversationMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    pub fn tool_result(call: &ToolCallRequest, content: impl Into<String>) -> Self {
        Self::Tool {
            call_id: call.call_id.clone(),
            name: call.name.clone(),
            content: content.into(),
        }
    }
}

/// Tool calls held back until the user decides on the interrupted ones
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingBatch {
    /// Every call of the assistant message, in order
    pub calls: Vec<ToolCallRequest>,
    /// Indices into `calls` that raised an interruption, in emission order
    pub interrupted: Vec<usize>,
}

impl PendingBatch {
    /// Whether the call at `index` raised an interruption
    pub fn is_interrupted(&self, index: usize) -> bool {
        self.interrupted.contains(&index)
    }
}

/// Saved state of one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub messages: Vec<ConversationMessage>,
    pub pending: Option<PendingBatch>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Checkpoint {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            pending: None,
            updated_at: Utc::now(),
        }
    }
}

/// Persistence handle for session checkpoints
pub trait Checkpointer: Send + Sync {
    fn load(&self, session_id: &str) -> Option<Checkpoint>;
    fn save(&self, session_id: &str, checkpoint: Checkpoint);
}

/// Checkpoints kept for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemoryCheckpointer {
    sessions: Mutex<HashMap<String, Checkpoint>>,
}

impl MemoryCheckpointer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Checkpointer for MemoryCheckpointer {
    fn load(&self, session_id: &str) -> Option<Checkpoint> {
        self.sessions.lock().get(session_id).cloned()
    }

    fn save(&self, session_id: &str, mut checkpoint: Checkpoint) {
        checkpoint.updated_at = Utc::now();
        self.sessions.lock().insert(session_id.to_string(), checkpoint);
    }
}
