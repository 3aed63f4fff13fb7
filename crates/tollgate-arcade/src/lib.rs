//! Tollgate Arcade - client for the Arcade tool service
//!
//! This crate talks to the hosted tool service that provides remote tools,
//! per-user authorization challenges, and tool execution:
//! - `client`: the HTTP client (`ArcadeClient`)
//! - `protocol`: wire types for requests and responses
//! - `schema`: conversion of tool definitions into model-facing JSON schemas

pub mod client;
pub mod protocol;
pub mod schema;

pub use client::{ArcadeClient, ArcadeError};
pub use protocol::{
    AuthorizationRequirement, AuthorizationResponse, AuthorizationStatus, ExecuteToolResponse,
    ToolDefinition, ToolParameter, ValueSchema,
};
pub use schema::{input_schema, model_tool_name};

/// Default API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.arcade.dev";

/// Seconds the status endpoint may hold a long-poll open
pub const AUTH_STATUS_WAIT_SECS: u64 = 59;
