//! Agent runtime interface
//!
//! The conversation loop drives an [`AgentRuntime`] one pass at a time: a pass
//! starts from a [`TurnInput`] and yields a stream of [`AgentUpdate`]s that
//! ends either when the model is done or when the runtime stops on
//! interruptions.
//!
//! [`ToolAgent`] is the shipped runtime. It binds a chat model to remote tools
//! and keeps per-session state in a [`Checkpointer`].

pub mod agent;
pub mod checkpoint;
pub mod model;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::interrupt::{Interruption, TurnInput};

pub use agent::{AgentSpec, ToolAgent};
pub use checkpoint::{
    Checkpoint, Checkpointer, ConversationMessage, MemoryCheckpointer, PendingBatch, ToolCallRequest,
};
pub use model::{ChatModel, DeltaSink, GenAiModel, ModelReply};

/// Session identifier used as the persistence key
pub type SessionId = String;

/// Updates of one pass
pub type UpdateStream = BoxStream<'static, Result<AgentUpdate>>;

/// How a pass reports progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamMode {
    /// One update per completed message
    #[default]
    Updates,
    /// Assistant text as it is generated, tool messages when complete
    Messages,
}

impl std::fmt::Display for StreamMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamMode::Updates => write!(f, "updates"),
            StreamMode::Messages => write!(f, "messages"),
        }
    }
}

/// Per-pass settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub session_id: SessionId,
    pub mode: StreamMode,
}

impl RunConfig {
    pub fn new(session_id: impl Into<SessionId>, mode: StreamMode) -> Self {
        Self {
            session_id: session_id.into(),
            mode,
        }
    }
}

/// A complete message produced during a pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum AgentMessage {
    Assistant {
        content: String,
        /// Model-facing names of the tools the assistant asked for
        tool_calls: Vec<String>,
    },
    Tool {
        name: String,
        content: String,
        success: bool,
    },
}

/// One item of a pass's update stream
#[derive(Debug, Clone, PartialEq)]
pub enum AgentUpdate {
    Message(AgentMessage),
    /// Fragment of assistant text, only in [`StreamMode::Messages`]
    Delta(String),
    /// The pass stopped; these need decisions, in order
    Interrupt(Vec<Interruption>),
}

/// Executes reasoning and tool-call passes for a session
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Start a pass. The stream must be consumed to the end.
    async fn stream(&self, input: TurnInput, config: &RunConfig) -> Result<UpdateStream>;
}
