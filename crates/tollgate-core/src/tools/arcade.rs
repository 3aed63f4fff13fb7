//! Tool provisioning and execution against the Arcade service

use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use tollgate_arcade::{ArcadeClient, ToolDefinition};

use crate::error::{Error, Result};
use crate::tools::{ToolExecutor, ToolProvisioner, ToolSpec};

/// Arcade-backed tool source and executor
#[derive(Clone)]
pub struct ArcadeToolService {
    client: ArcadeClient,
}

impl ArcadeToolService {
    pub fn new(client: ArcadeClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ArcadeClient {
        &self.client
    }
}

/// Keep the first definition of each qualified name, then cap at `limit`
pub(crate) fn collect_specs(definitions: Vec<ToolDefinition>, limit: usize) -> Vec<ToolSpec> {
    let mut seen = HashSet::new();
    definitions
        .into_iter()
        .filter(|def| seen.insert(def.qualified_name.clone()))
        .take(limit)
        .map(|def| ToolSpec::from_definition(&def))
        .collect()
}

#[async_trait]
impl ToolProvisioner for ArcadeToolService {
    async fn fetch(
        &self,
        identity: &str,
        toolkits: &[String],
        isolated_tools: &[String],
        limit: usize,
    ) -> Result<Vec<ToolSpec>> {
        let mut definitions = Vec::new();

        for toolkit in toolkits {
            let tools = self.client.list_tools(toolkit, identity, limit).await?;
            if tools.is_empty() {
                warn!(toolkit = %toolkit, "Toolkit returned no tools");
            }
            definitions.extend(tools);
        }

        for name in isolated_tools {
            definitions.push(self.client.get_tool(name).await?);
        }

        let specs = collect_specs(definitions, limit);
        info!(
            count = specs.len(),
            toolkits = toolkits.len(),
            isolated = isolated_tools.len(),
            "Fetched tools"
        );
        Ok(specs)
    }
}

#[async_trait]
impl ToolExecutor for ArcadeToolService {
    async fn execute(&self, tool: &ToolSpec, input: &Value, identity: &str) -> Result<String> {
        debug!(tool = %tool.qualified_name, "Executing tool");
        let response = self
            .client
            .execute(&tool.qualified_name, input, identity)
            .await?;
        response.into_text().map_err(Error::Tool)
    }
}
