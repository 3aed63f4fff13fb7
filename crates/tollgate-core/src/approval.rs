//! Human-in-the-loop confirmation policy
//!
//! Decides which tool calls the runtime must stop on and hand to the user as
//! an approval interruption before they run.

use std::collections::HashSet;

use tollgate_arcade::model_tool_name;

/// Wildcard entry matching every tool
pub const ALL_TOOLS: &str = "*";

/// Set of tools whose calls need an explicit yes/no from the user
#[derive(Debug, Clone, Default)]
pub struct ConfirmationPolicy {
    tools: HashSet<String>,
    confirm_all: bool,
}

impl ConfirmationPolicy {
    /// Build from configured names. Qualified names (`Gmail.SendEmail`) are
    /// accepted and matched as their model-facing form (`Gmail_SendEmail`).
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut policy = Self::none();
        for name in names {
            let name = name.as_ref().trim();
            if name == ALL_TOOLS {
                return Self::all();
            } else if !name.is_empty() {
                policy.tools.insert(model_tool_name(name));
            }
        }
        policy
    }

    /// No confirmations at all
    pub fn none() -> Self {
        Self::default()
    }

    /// Confirm every tool call
    pub fn all() -> Self {
        Self {
            tools: HashSet::new(),
            confirm_all: true,
        }
    }

    pub fn requires_confirmation(&self, tool_name: &str) -> bool {
        self.confirm_all || self.tools.contains(&model_tool_name(tool_name))
    }

    pub fn is_empty(&self) -> bool {
        !self.confirm_all && self.tools.is_empty()
    }
}
