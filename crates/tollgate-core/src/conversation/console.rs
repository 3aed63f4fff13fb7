//! User-facing I/O seam for the conversation loop

use serde_json::Value;

use crate::error::Result;
use crate::runtime::AgentMessage;

/// Something the loop wants the user to see
#[derive(Debug, Clone, PartialEq)]
pub enum Notice<'a> {
    Welcome,
    Goodbye,
    /// Fragment of assistant text
    Delta(&'a str),
    Message(&'a AgentMessage),
    AuthorizationRequired { tool_name: &'a str, url: &'a str },
    /// The loop is blocked on the authorization service
    AwaitingAuthorization,
    AuthorizationGranted,
    AuthorizationFailed { error: &'a str },
    ApprovalRequired { tool_name: &'a str, input: &'a Value },
    /// An interruption of unknown kind was denied
    UnsupportedInterruption,
    TurnFailed { error: &'a str },
}

/// Interactive terminal (or a scripted stand-in)
pub trait Console {
    /// Read one line. `None` means the input is closed.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;

    /// Ask a yes/no question
    fn confirm(&mut self, question: &str) -> Result<bool>;

    fn show(&mut self, notice: Notice<'_>);
}
