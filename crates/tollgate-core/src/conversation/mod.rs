//! Conversation loop
//!
//! Reads user lines, drives the agent runtime one pass at a time, and answers
//! every interruption a pass raises before resuming it. A turn ends only when
//! a pass finishes without interruptions.
//!
//! Per turn the loop moves through
//! `AwaitingInput -> Running -> (Interrupted -> Resolving -> Running)* -> AwaitingInput`.

pub mod console;
pub mod resolver;

use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, error, info};

use crate::auth::AuthorizationService;
use crate::config::Config;
use crate::error::Result;
use crate::interrupt::{Interruption, Resume, TurnInput};
use crate::runtime::{AgentRuntime, AgentUpdate, RunConfig, SessionId};

pub use console::{Console, Notice};
pub use resolver::{InterruptResolver, APPROVAL_QUESTION};

/// Input prompt
pub const PROMPT: &str = "> ";

/// Whether a line ends the session: `exit` in any letter case
pub fn is_exit(line: &str) -> bool {
    line.eq_ignore_ascii_case("exit")
}

/// Where the loop is within a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    AwaitingInput,
    Running,
    Interrupted,
    Resolving,
}

impl std::fmt::Display for TurnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnState::AwaitingInput => write!(f, "awaiting_input"),
            TurnState::Running => write!(f, "running"),
            TurnState::Interrupted => write!(f, "interrupted"),
            TurnState::Resolving => write!(f, "resolving"),
        }
    }
}

/// What one completed turn took
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnSummary {
    /// Runtime invocations, including resumptions
    pub passes: usize,
    /// Resume payloads sent, in order
    pub decisions: Vec<Resume>,
}

/// Drives one session from the first line to `exit`
pub struct ConversationLoop {
    session_id: SessionId,
    run_config: RunConfig,
    runtime: Arc<dyn AgentRuntime>,
    resolver: InterruptResolver,
    state: TurnState,
}

impl ConversationLoop {
    pub fn new(
        config: &Config,
        runtime: Arc<dyn AgentRuntime>,
        authorizer: Arc<dyn AuthorizationService>,
    ) -> Self {
        Self {
            session_id: config.session_id.clone(),
            run_config: RunConfig::new(config.session_id.clone(), config.stream_mode),
            runtime,
            resolver: InterruptResolver::new(authorizer),
            state: TurnState::AwaitingInput,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    fn transition(&mut self, next: TurnState) {
        debug!(session = %self.session_id, from = %self.state, to = %next, "Turn state");
        self.state = next;
    }

    /// Run until `exit` or end of input.
    ///
    /// A failed turn is reported and the loop keeps prompting; only console
    /// failures end the loop with an error.
    pub async fn run(&mut self, console: &mut dyn Console) -> Result<()> {
        info!(session = %self.session_id, "Conversation started");
        console.show(Notice::Welcome);

        loop {
            let Some(line) = console.read_line(PROMPT)? else {
                debug!("Input closed");
                break;
            };
            if is_exit(&line) {
                break;
            }

            if let Err(e) = self.run_turn(&line, console).await {
                error!(session = %self.session_id, error = %e, "Turn failed");
                console.show(Notice::TurnFailed {
                    error: &e.to_string(),
                });
                self.transition(TurnState::AwaitingInput);
            }
        }

        console.show(Notice::Goodbye);
        info!(session = %self.session_id, "Conversation ended");
        Ok(())
    }

    /// One user turn: pass, resolve, resume, until a pass raises nothing
    pub async fn run_turn(&mut self, text: &str, console: &mut dyn Console) -> Result<TurnSummary> {
        let mut input = TurnInput::message(text);
        let mut summary = TurnSummary {
            passes: 0,
            decisions: Vec::new(),
        };

        loop {
            let interruptions = self.run_pass(input, console).await?;
            summary.passes += 1;

            if interruptions.is_empty() {
                self.transition(TurnState::AwaitingInput);
                debug!(passes = summary.passes, "Turn complete");
                return Ok(summary);
            }

            self.transition(TurnState::Interrupted);
            info!(count = interruptions.len(), "Resolving interruptions");
            self.transition(TurnState::Resolving);

            let mut decisions = Vec::with_capacity(interruptions.len());
            for interruption in &interruptions {
                decisions.push(self.resolver.resolve(interruption, console).await);
            }

            let resume = Resume::from_decisions(decisions);
            summary.decisions.push(resume.clone());
            input = TurnInput::resume(resume);
        }
    }

    /// One runtime invocation, consumed to the end. Returns the
    /// interruptions it raised, in emission order.
    pub async fn run_pass(&mut self, input: TurnInput, console: &mut dyn Console) -> Result<Vec<Interruption>> {
        self.transition(TurnState::Running);

        let mut stream = self.runtime.stream(input, &self.run_config).await?;
        let mut interruptions = Vec::new();

        while let Some(update) = stream.next().await {
            match update? {
                AgentUpdate::Message(message) => console.show(Notice::Message(&message)),
                AgentUpdate::Delta(text) => console.show(Notice::Delta(&text)),
                AgentUpdate::Interrupt(raised) => interruptions.extend(raised),
            }
        }

        Ok(interruptions)
    }
}
