//! Remote tools offered to the model
//!
//! A [`ToolSpec`] is what the runtime hands to the model and what it needs to
//! gate a call: the model-facing name, the service's qualified name, the JSON
//! schema for arguments, and the authorization the tool requires.
//!
//! Fetching and executing tools go through the [`ToolProvisioner`] and
//! [`ToolExecutor`] traits; `arcade` holds the hosted-service implementation.

pub mod arcade;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use tollgate_arcade::{input_schema, model_tool_name, ToolDefinition};

use crate::error::Result;

pub use arcade::ArcadeToolService;

/// Authorization a tool needs before it can run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRequirement {
    pub provider_id: Option<String>,
    pub scopes: Vec<String>,
}

/// Tool definition for model consumption
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Model-facing name (`Toolkit_Tool`)
    pub name: String,
    /// Service name (`Toolkit.Tool`)
    pub qualified_name: String,
    pub description: String,
    /// JSON schema for the arguments
    pub parameters: Value,
    pub authorization: Option<AuthRequirement>,
}

impl ToolSpec {
    pub fn from_definition(definition: &ToolDefinition) -> Self {
        let authorization = definition.authorization().map(|auth| AuthRequirement {
            provider_id: auth.provider_id.clone(),
            scopes: auth.scopes().to_vec(),
        });

        Self {
            name: model_tool_name(&definition.qualified_name),
            qualified_name: definition.qualified_name.clone(),
            description: definition.description.clone().unwrap_or_default(),
            parameters: input_schema(definition),
            authorization,
        }
    }

    pub fn requires_authorization(&self) -> bool {
        self.authorization.is_some()
    }
}

/// The tools bound to one agent, looked up by model-facing name
#[derive(Debug, Clone, Default)]
pub struct ToolSet {
    tools: Vec<ToolSpec>,
}

impl ToolSet {
    pub fn new(tools: Vec<ToolSpec>) -> Self {
        Self { tools }
    }

    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn specs(&self) -> &[ToolSpec] {
        &self.tools
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl From<Vec<ToolSpec>> for ToolSet {
    fn from(tools: Vec<ToolSpec>) -> Self {
        Self::new(tools)
    }
}

/// Source of callable tool definitions
#[async_trait]
pub trait ToolProvisioner: Send + Sync {
    /// Fetch the tools of `toolkits` plus each of `isolated_tools`, at most
    /// `limit` in total, de-duplicated by qualified name
    async fn fetch(
        &self,
        identity: &str,
        toolkits: &[String],
        isolated_tools: &[String],
        limit: usize,
    ) -> Result<Vec<ToolSpec>>;
}

/// Runs a tool call on behalf of a user
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Execute and return the text handed back to the model.
    ///
    /// A tool-reported failure is `Err(Error::Tool(..))`.
    async fn execute(&self, tool: &ToolSpec, input: &Value, identity: &str) -> Result<String>;
}
