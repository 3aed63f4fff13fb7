//! Chat model seam and its genai implementation

use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use genai::chat::{
    ChatMessage, ChatOptions, ChatRequest, ChatStreamEvent, Tool, ToolCall, ToolResponse,
};
use genai::{Client, WebConfig};
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::runtime::checkpoint::{ConversationMessage, ToolCallRequest};
use crate::tools::ToolSpec;

/// Receives assistant text fragments as they arrive
pub type DeltaSink = dyn Fn(&str) + Send + Sync;

/// One model response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallRequest>,
}

/// A model that can answer with text or tool calls
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(
        &self,
        system: &str,
        messages: &[ConversationMessage],
        tools: &[ToolSpec],
        on_delta: &DeltaSink,
    ) -> Result<ModelReply>;
}

/// Chat model reached through genai; provider keys come from the environment
pub struct GenAiModel {
    client: Client,
    model: String,
}

impl GenAiModel {
    /// Default timeout for LLM API requests (5 minutes)
    const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

    fn default_web_config() -> WebConfig {
        WebConfig::default()
            .with_timeout(Self::DEFAULT_TIMEOUT)
            .with_connect_timeout(Duration::from_secs(30))
    }

    pub fn new(model: impl Into<String>) -> Self {
        let client = Client::builder()
            .with_web_config(Self::default_web_config())
            .build();
        Self {
            client,
            model: model.into(),
        }
    }

    /// Tool calls only arrive whole when genai accumulates them for us
    fn chat_options() -> ChatOptions {
        ChatOptions::default().with_capture_tool_calls(true)
    }

    fn build_request(system: &str, messages: &[ConversationMessage], tools: &[ToolSpec]) -> ChatRequest {
        let mut chat_req = ChatRequest::default().with_system(system);

        for msg in messages {
            chat_req = match msg {
                ConversationMessage::User { content } => {
                    chat_req.append_message(ChatMessage::user(content.clone()))
                }
                // Tool calls go out as a single assistant message; any text
                // alongside them is dropped
                ConversationMessage::Assistant { tool_calls, .. } if !tool_calls.is_empty() => {
                    let calls: Vec<ToolCall> = tool_calls
                        .iter()
                        .map(|tc| ToolCall {
                            call_id: tc.call_id.clone(),
                            fn_name: tc.name.clone(),
                            fn_arguments: tc.arguments.clone(),
                            thought_signatures: None,
                        })
                        .collect();
                    chat_req.append_message(calls)
                }
                ConversationMessage::Assistant { content, .. } => {
                    chat_req.append_message(ChatMessage::assistant(content.clone().unwrap_or_default()))
                }
                ConversationMessage::Tool { call_id, content, .. } => {
                    chat_req.append_message(ToolResponse::new(call_id.clone(), content.clone()))
                }
            };
        }

        if !tools.is_empty() {
            let genai_tools: Vec<Tool> = tools
                .iter()
                .map(|t| {
                    Tool::new(&t.name)
                        .with_description(&t.description)
                        .with_schema(t.parameters.clone())
                })
                .collect();
            chat_req = chat_req.with_tools(genai_tools);
        }

        chat_req
    }
}

#[async_trait]
impl ChatModel for GenAiModel {
    async fn complete(
        &self,
        system: &str,
        messages: &[ConversationMessage],
        tools: &[ToolSpec],
        on_delta: &DeltaSink,
    ) -> Result<ModelReply> {
        let chat_req = Self::build_request(system, messages, tools);

        let response = self
            .client
            .exec_chat_stream(&self.model, chat_req, Some(&Self::chat_options()))
            .await
            .map_err(|e| {
                error!(error = ?e, model = %self.model, "LLM request failed");
                Error::Provider(format!("GenAI error: {:?}", e))
            })?;

        let reply = collect_reply(response.stream, on_delta).await.map_err(|e| {
            error!(error = ?e, model = %self.model, "LLM stream error");
            Error::Provider(format!("GenAI stream error: {:?}", e))
        })?;

        debug!(
            model = %self.model,
            chars = reply.content.as_deref().map_or(0, str::len),
            tool_calls = reply.tool_calls.len(),
            "Model replied"
        );

        Ok(reply)
    }
}

/// Drain a chat stream: text chunks go to `on_delta` as they arrive, tool
/// calls are taken from the end event once their arguments are complete
async fn collect_reply<S>(mut stream: S, on_delta: &DeltaSink) -> genai::Result<ModelReply>
where
    S: Stream<Item = genai::Result<ChatStreamEvent>> + Unpin,
{
    let mut content = String::new();
    let mut tool_calls = Vec::new();

    while let Some(event) = stream.next().await {
        match event? {
            ChatStreamEvent::Chunk(chunk) => {
                if !chunk.content.is_empty() {
                    on_delta(&chunk.content);
                    content.push_str(&chunk.content);
                }
            }
            ChatStreamEvent::End(end) => {
                tool_calls = end
                    .captured_into_tool_calls()
                    .unwrap_or_default()
                    .into_iter()
                    .map(|call| ToolCallRequest {
                        call_id: call.call_id,
                        name: call.fn_name,
                        arguments: normalize_arguments(call.fn_arguments),
                    })
                    .collect();
                break;
            }
            // Fragments; the end event carries the assembled calls
            ChatStreamEvent::ToolCallChunk(_) => {}
            _ => {}
        }
    }

    Ok(ModelReply {
        content: if content.is_empty() { None } else { Some(content) },
        tool_calls,
    })
}

/// Calls without arguments arrive as an empty string
fn normalize_arguments(arguments: Value) -> Value {
    match arguments {
        Value::Null => json!({}),
        Value::String(s) if s.trim().is_empty() => json!({}),
        other => other,
    }
}
