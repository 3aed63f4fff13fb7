//! Arcade wire types
//!
//! Only the fields the client reads are modelled; everything else in the
//! service's responses is ignored on deserialization.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool definition as returned by the tool listing endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    /// `Toolkit.Tool`
    pub qualified_name: String,
    /// `Toolkit.Tool@version`
    #[serde(default)]
    pub fully_qualified_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub toolkit: ToolkitInfo,
    #[serde(default)]
    pub input: ToolInput,
    #[serde(default)]
    pub requirements: Option<ToolRequirements>,
}

impl ToolDefinition {
    /// Authorization requirement, if the tool needs one
    pub fn authorization(&self) -> Option<&AuthorizationRequirement> {
        self.requirements.as_ref()?.authorization.as_ref()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolkitInfo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolInput {
    #[serde(default)]
    pub parameters: Vec<ToolParameter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: Option<String>,
    pub value_schema: ValueSchema,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueSchema {
    /// string, integer, number, boolean, array, json
    pub val_type: String,
    #[serde(default)]
    pub inner_val_type: Option<String>,
    #[serde(default, rename = "enum")]
    pub enum_values: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolRequirements {
    #[serde(default)]
    pub authorization: Option<AuthorizationRequirement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationRequirement {
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub provider_type: Option<String>,
    #[serde(default)]
    pub oauth2: Option<OAuth2Requirement>,
}

impl AuthorizationRequirement {
    pub fn scopes(&self) -> &[String] {
        self.oauth2.as_ref().map(|o| o.scopes.as_slice()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OAuth2Requirement {
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// One page of the tool listing
#[derive(Debug, Clone, Deserialize)]
pub struct ToolPage {
    #[serde(default)]
    pub items: Vec<ToolDefinition>,
    #[serde(default)]
    pub total_count: Option<u64>,
}

/// State of an authorization challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    NotStarted,
    Pending,
    Completed,
    Failed,
}

impl AuthorizationStatus {
    /// Still waiting on the user
    pub fn is_waiting(&self) -> bool {
        matches!(self, AuthorizationStatus::NotStarted | AuthorizationStatus::Pending)
    }
}

impl std::fmt::Display for AuthorizationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthorizationStatus::NotStarted => write!(f, "not_started"),
            AuthorizationStatus::Pending => write!(f, "pending"),
            AuthorizationStatus::Completed => write!(f, "completed"),
            AuthorizationStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationResponse {
    #[serde(default)]
    pub id: Option<String>,
    pub status: AuthorizationStatus,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct AuthorizeToolRequest<'a> {
    pub tool_name: &'a str,
    pub user_id: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ExecuteToolRequest<'a> {
    pub tool_name: &'a str,
    pub input: &'a Value,
    pub user_id: &'a str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteToolResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub output: Option<ToolOutput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub error: Option<ToolOutputError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutputError {
    pub message: String,
}

impl ExecuteToolResponse {
    /// Render the output as the text handed back to the model.
    ///
    /// Returns `Err` with the service's message when the tool failed.
    pub fn into_text(self) -> Result<String, String> {
        let output = self.output.unwrap_or(ToolOutput { value: None, error: None });
        if let Some(error) = output.error {
            return Err(error.message);
        }
        if self.success == Some(false) {
            return Err("Tool execution failed".to_string());
        }
        Ok(match output.value {
            Some(Value::String(s)) => s,
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        })
    }
}
