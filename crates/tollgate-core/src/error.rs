//! Error types for Tollgate Core

use thiserror::Error;
use tollgate_arcade::ArcadeError;

/// Result type alias using Tollgate Error
pub type Result<T> = std::result::Result<T, Error>;

/// Tollgate error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing {0}. Set it in your environment.")]
    MissingEnv(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Console error: {0}")]
    Console(String),

    #[error("Tool service error: {0}")]
    Arcade(#[from] ArcadeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
