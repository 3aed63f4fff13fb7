//! Tool-calling agent runtime
//!
//! Each pass:
//! - loads the session checkpoint
//! - applies the input (a new user message, or decisions for the batch that
//!   stopped the previous pass)
//! - calls the model until it answers without tool calls, gating every
//!   requested call on authorization and confirmation first
//! - saves the checkpoint, whatever the outcome
//!
//! A pass that hits a gated call stores the whole batch as pending and ends
//! with a single `Interrupt` update. The next pass must resume it with one
//! decision per interrupted call, in order.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

use crate::approval::ConfirmationPolicy;
use crate::auth::{AuthCheck, AuthorizationService};
use crate::error::{Error, Result};
use crate::interrupt::{Interruption, Resume, TurnInput};
use crate::runtime::checkpoint::{
    Checkpoint, Checkpointer, ConversationMessage, PendingBatch, ToolCallRequest,
};
use crate::runtime::model::{ChatModel, DeltaSink};
use crate::runtime::{AgentMessage, AgentRuntime, AgentUpdate, RunConfig, StreamMode, UpdateStream};
use crate::tools::{ToolExecutor, ToolSet};

/// Tool result recorded for a call the user declined
pub const DENIED_RESULT: &str = "The user denied this tool call.";
/// Tool result recorded for calls abandoned by a new user message
pub const NOT_EXECUTED_RESULT: &str = "This tool call was not executed.";

type UpdateSender = mpsc::UnboundedSender<Result<AgentUpdate>>;

/// What an agent is built from
#[derive(Debug, Clone)]
pub struct AgentSpec {
    pub system_prompt: String,
    pub tools: ToolSet,
    /// User the tools run for
    pub user_id: String,
    pub confirmation: ConfirmationPolicy,
    /// Model calls allowed per pass
    pub max_steps: usize,
}

/// Runtime binding a chat model to remote tools
#[derive(Clone)]
pub struct ToolAgent {
    inner: Arc<AgentInner>,
}

struct AgentInner {
    spec: AgentSpec,
    model: Arc<dyn ChatModel>,
    executor: Arc<dyn ToolExecutor>,
    gate: Arc<dyn AuthorizationService>,
    checkpointer: Arc<dyn Checkpointer>,
    /// Passes run one at a time
    pass_lock: Mutex<()>,
}

impl ToolAgent {
    pub fn new(
        spec: AgentSpec,
        model: Arc<dyn ChatModel>,
        executor: Arc<dyn ToolExecutor>,
        gate: Arc<dyn AuthorizationService>,
        checkpointer: Arc<dyn Checkpointer>,
    ) -> Self {
        info!(
            tools = spec.tools.len(),
            max_steps = spec.max_steps,
            confirms = !spec.confirmation.is_empty(),
            "Agent created"
        );
        debug!(tools = ?spec.tools.names(), "Agent tools");
        Self {
            inner: Arc::new(AgentInner {
                spec,
                model,
                executor,
                gate,
                checkpointer,
                pass_lock: Mutex::new(()),
            }),
        }
    }
}

#[async_trait]
impl AgentRuntime for ToolAgent {
    async fn stream(&self, input: TurnInput, config: &RunConfig) -> Result<UpdateStream> {
        let (tx, rx) = mpsc::unbounded_channel();
        let inner = Arc::clone(&self.inner);
        let config = config.clone();

        tokio::spawn(async move {
            if let Err(e) = inner.run_pass(input, &config, &tx).await {
                error!(session = %config.session_id, error = %e, "Pass failed");
                let _ = tx.send(Err(e));
            }
        });

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        Ok(stream.boxed())
    }
}

impl AgentInner {
    async fn run_pass(&self, input: TurnInput, config: &RunConfig, tx: &UpdateSender) -> Result<()> {
        let _guard = self.pass_lock.lock().await;
        let session_id = config.session_id.as_str();

        let mut checkpoint = self.checkpointer.load(session_id).unwrap_or_default();
        let result = self.drive(&mut checkpoint, input, config.mode, tx).await;
        self.checkpointer.save(session_id, checkpoint);

        debug!(session = %session_id, ok = result.is_ok(), "Pass finished");
        result
    }

    async fn drive(
        &self,
        checkpoint: &mut Checkpoint,
        input: TurnInput,
        mode: StreamMode,
        tx: &UpdateSender,
    ) -> Result<()> {
        match input {
            TurnInput::Message { content } => {
                if let Some(batch) = checkpoint.pending.take() {
                    warn!(calls = batch.calls.len(), "Closing tool calls left pending by an abandoned turn");
                    close_calls(checkpoint, &batch.calls, NOT_EXECUTED_RESULT);
                }
                checkpoint.messages.push(ConversationMessage::user(content));
            }
            TurnInput::Resume { resume } => self.resume_batch(checkpoint, resume, tx).await?,
        }

        let on_delta: Box<DeltaSink> = match mode {
            StreamMode::Messages => {
                let delta_tx = tx.clone();
                Box::new(move |text: &str| {
                    let _ = delta_tx.send(Ok(AgentUpdate::Delta(text.to_string())));
                })
            }
            StreamMode::Updates => Box::new(|_: &str| {}),
        };

        for step in 0..self.spec.max_steps {
            let reply = self
                .model
                .complete(
                    &self.spec.system_prompt,
                    &checkpoint.messages,
                    self.spec.tools.specs(),
                    on_delta.as_ref(),
                )
                .await?;

            debug!(step, tool_calls = reply.tool_calls.len(), "Model step");

            let calls = reply.tool_calls;
            checkpoint.messages.push(ConversationMessage::Assistant {
                content: reply.content.clone(),
                tool_calls: calls.clone(),
            });

            // In messages mode the text already went out as deltas
            if mode == StreamMode::Updates {
                let _ = tx.send(Ok(AgentUpdate::Message(AgentMessage::Assistant {
                    content: reply.content.unwrap_or_default(),
                    tool_calls: calls.iter().map(|c| c.name.clone()).collect(),
                })));
            }

            if calls.is_empty() {
                return Ok(());
            }

            let mut interruptions = Vec::new();
            let mut interrupted = Vec::new();
            for (index, call) in calls.iter().enumerate() {
                match self.gate_call(call).await {
                    Ok(Some(interruption)) => {
                        interruptions.push(interruption);
                        interrupted.push(index);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        // Every call in the saved history needs an answer
                        warn!(tool = %call.name, error = %e, "Authorization check failed");
                        close_calls(checkpoint, &calls, &format!("Error: {}", e));
                        return Err(e);
                    }
                }
            }

            if !interruptions.is_empty() {
                info!(
                    calls = calls.len(),
                    interrupted = interruptions.len(),
                    "Pass interrupted"
                );
                checkpoint.pending = Some(PendingBatch { calls, interrupted });
                let _ = tx.send(Ok(AgentUpdate::Interrupt(interruptions)));
                return Ok(());
            }

            for call in &calls {
                self.execute_call(checkpoint, call, tx).await;
            }
        }

        Err(Error::Runtime(format!(
            "Stopped after {} model steps without a final answer",
            self.spec.max_steps
        )))
    }

    /// Finish the pending batch with the user's decisions
    async fn resume_batch(&self, checkpoint: &mut Checkpoint, resume: Resume, tx: &UpdateSender) -> Result<()> {
        let expected = match &checkpoint.pending {
            Some(batch) => batch.interrupted.len(),
            None => return Err(Error::Runtime("Nothing to resume: no tool calls are pending".to_string())),
        };
        if resume.len() != expected {
            return Err(Error::Runtime(format!(
                "Expected {} decision(s), got {}",
                expected,
                resume.len()
            )));
        }

        let Some(batch) = checkpoint.pending.take() else {
            return Ok(());
        };
        // Interrupted indices are ascending, so decisions line up in order
        let mut decisions = resume.into_decisions().into_iter();

        for (index, call) in batch.calls.iter().enumerate() {
            let denied = batch.is_interrupted(index)
                && decisions.next().is_some_and(|decision| !decision.authorized);

            if denied {
                info!(tool = %call.name, "Tool call denied");
                checkpoint
                    .messages
                    .push(ConversationMessage::tool_result(call, DENIED_RESULT));
                let _ = tx.send(Ok(AgentUpdate::Message(AgentMessage::Tool {
                    name: call.name.clone(),
                    content: DENIED_RESULT.to_string(),
                    success: false,
                })));
            } else {
                self.execute_call(checkpoint, call, tx).await;
            }
        }
        Ok(())
    }

    /// Interruption the call must wait on, if any
    async fn gate_call(&self, call: &ToolCallRequest) -> Result<Option<Interruption>> {
        let Some(tool) = self.spec.tools.get(&call.name) else {
            return Ok(None);
        };

        if tool.requires_authorization() {
            let check = self
                .gate
                .authorize(&tool.qualified_name, &self.spec.user_id)
                .await?;
            if let AuthCheck::Required(challenge) = check {
                return Ok(Some(Interruption::authorization(&tool.name, challenge)));
            }
        }

        if self.spec.confirmation.requires_confirmation(&tool.name) {
            return Ok(Some(Interruption::approval(&tool.name, call.arguments.clone())));
        }

        Ok(None)
    }

    /// Run one call; failures become an error result for the model
    async fn execute_call(&self, checkpoint: &mut Checkpoint, call: &ToolCallRequest, tx: &UpdateSender) {
        let (content, success) = match self.spec.tools.get(&call.name) {
            Some(tool) => match self
                .executor
                .execute(tool, &call.arguments, &self.spec.user_id)
                .await
            {
                Ok(output) => (output, true),
                Err(e) => {
                    warn!(tool = %call.name, error = %e, "Tool execution failed");
                    (format!("Error: {}", e), false)
                }
            },
            None => {
                warn!(tool = %call.name, "Model called an unknown tool");
                (format!("Error: unknown tool '{}'", call.name), false)
            }
        };

        checkpoint
            .messages
            .push(ConversationMessage::tool_result(call, content.clone()));
        let _ = tx.send(Ok(AgentUpdate::Message(AgentMessage::Tool {
            name: call.name.clone(),
            content,
            success,
        })));
    }
}

/// Answer every call in a batch with the same result, without running any
fn close_calls(checkpoint: &mut Checkpoint, calls: &[ToolCallRequest], content: &str) {
    for call in calls {
        checkpoint
            .messages
            .push(ConversationMessage::tool_result(call, content));
    }
}
