//! Configuration for Tollgate
//!
//! Two layers: an optional TOML file (`~/.config/tollgate/config.toml`, or the
//! path in `TOLLGATE_CONFIG`) holding behavioural settings, and environment
//! variables holding identity, model, and service credentials. Required
//! variables fail fast and the error names the missing variable.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::prompt::DEFAULT_SYSTEM_PROMPT;
use crate::runtime::StreamMode;

/// User the tools are authorized for
pub const ENV_USER_ID: &str = "ARCADE_USER_ID";
/// Model identifier handed to the model provider
pub const ENV_MODEL: &str = "OPENAI_MODEL";
/// Tool service API key
pub const ENV_API_KEY: &str = "ARCADE_API_KEY";
/// Tool service endpoint override
pub const ENV_BASE_URL: &str = "ARCADE_BASE_URL";
/// Config file location override
pub const ENV_CONFIG_PATH: &str = "TOLLGATE_CONFIG";

/// Default values for settings
pub mod defaults {
    pub const TOOLKITS: &[&str] = &["GoogleNews"];
    pub const TOOL_LIMIT: usize = 100;
    pub const MAX_STEPS: usize = 25;
}

/// File-backed settings; every key is optional
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Toolkits whose tools are offered to the model
    pub toolkits: Vec<String>,
    /// Individual tools fetched by qualified name (e.g. `Gmail.SendEmail`)
    pub isolated_tools: Vec<String>,
    /// Upper bound on the number of tools offered
    pub tool_limit: usize,
    /// Model-facing tool names that need a yes/no confirmation; `*` for all
    pub confirm_tools: Vec<String>,
    pub system_prompt: String,
    /// Model calls allowed per pass
    pub max_steps: usize,
    pub stream_mode: StreamMode,
    /// Fixed session id; a random one is generated when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            toolkits: defaults::TOOLKITS.iter().map(|s| s.to_string()).collect(),
            isolated_tools: Vec::new(),
            tool_limit: defaults::TOOL_LIMIT,
            confirm_tools: Vec::new(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_steps: defaults::MAX_STEPS,
            stream_mode: StreamMode::default(),
            session_id: None,
        }
    }
}

impl Settings {
    /// Default config file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not find config directory".to_string()))?;
        Ok(config_dir.join("tollgate").join("config.toml"))
    }

    /// Load settings from a file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config {}: {}", path.display(), e)))?;

        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config {}: {}", path.display(), e)))
    }
}

/// Everything the conversation loop and its collaborators are built from
#[derive(Debug, Clone)]
pub struct Config {
    pub user_id: String,
    pub model: String,
    pub arcade_api_key: String,
    pub arcade_base_url: String,
    pub toolkits: Vec<String>,
    pub isolated_tools: Vec<String>,
    pub tool_limit: usize,
    pub confirm_tools: Vec<String>,
    pub system_prompt: String,
    pub max_steps: usize,
    pub stream_mode: StreamMode,
    pub session_id: String,
}

impl Config {
    /// Build the configuration from the process environment and the config file
    pub fn from_env() -> Result<Self> {
        let lookup = |name: &str| std::env::var(name).ok();

        let path = match lookup(ENV_CONFIG_PATH).filter(|p| !p.trim().is_empty()) {
            Some(path) => PathBuf::from(path),
            None => Settings::default_path()?,
        };
        let settings = Settings::load(&path)?;

        Self::from_sources(settings, lookup)
    }

    /// Build the configuration from settings and an environment lookup.
    ///
    /// Required variables are checked in a fixed order (user, model, API key);
    /// an empty value counts as missing.
    pub fn from_sources(settings: Settings, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(Error::MissingEnv(name))
        };

        let user_id = required(ENV_USER_ID)?;
        let model = required(ENV_MODEL)?;
        let arcade_api_key = required(ENV_API_KEY)?;
        let arcade_base_url = lookup(ENV_BASE_URL)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| tollgate_arcade::DEFAULT_BASE_URL.to_string());

        if settings.max_steps == 0 {
            return Err(Error::Config("max_steps must be at least 1".to_string()));
        }

        let session_id = settings
            .session_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        Ok(Self {
            user_id,
            model,
            arcade_api_key,
            arcade_base_url,
            toolkits: settings.toolkits,
            isolated_tools: settings.isolated_tools,
            tool_limit: settings.tool_limit,
            confirm_tools: settings.confirm_tools,
            system_prompt: settings.system_prompt,
            max_steps: settings.max_steps,
            stream_mode: settings.stream_mode,
            session_id,
        })
    }
}
