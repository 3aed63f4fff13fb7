//! Tollgate Core - tool-calling chat sessions with authorization and approval gates
//!
//! This crate provides the core functionality for the Tollgate chatbot:
//! - Configuration from the environment and an optional TOML file
//! - The interruption model (interruptions, decisions, resume payloads)
//! - Interfaces for the agent runtime, tool provisioning, and authorization
//! - A tool-calling runtime over genai with in-memory checkpoints
//! - The conversation loop that resolves interruptions and resumes passes

pub mod approval;
pub mod auth;
pub mod config;
pub mod conversation;
pub mod error;
pub mod interrupt;
pub mod prompt;
pub mod runtime;
pub mod tools;

pub use approval::ConfirmationPolicy;
pub use auth::{ArcadeAuthorizer, AuthCheck, AuthorizationService};
pub use config::{Config, Settings};
pub use conversation::{is_exit, Console, ConversationLoop, InterruptResolver, Notice, TurnState, TurnSummary};
pub use error::{Error, Result};
pub use interrupt::{AuthChallenge, Decision, Interruption, Resume, TurnInput};
pub use prompt::DEFAULT_SYSTEM_PROMPT;
pub use runtime::{
    AgentMessage, AgentRuntime, AgentSpec, AgentUpdate, ChatModel, Checkpointer, GenAiModel,
    MemoryCheckpointer, RunConfig, SessionId, StreamMode, ToolAgent, UpdateStream,
};
pub use tools::{ArcadeToolService, ToolExecutor, ToolProvisioner, ToolSet, ToolSpec};
