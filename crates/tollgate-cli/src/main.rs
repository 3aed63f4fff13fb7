//! Tollgate CLI - chat with remote tools behind authorization and approval gates
//!
//! Reads `ARCADE_USER_ID`, `OPENAI_MODEL`, and `ARCADE_API_KEY` from the
//! environment, fetches the configured toolkits, and runs an interactive chat.
//! Type `exit` (any case) or press Ctrl-D to quit.

mod terminal;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tollgate_arcade::ArcadeClient;
use tollgate_core::{
    AgentSpec, ArcadeAuthorizer, ArcadeToolService, Config, ConfirmationPolicy, ConversationLoop,
    GenAiModel, MemoryCheckpointer, ToolAgent, ToolProvisioner, ToolSet,
};

use terminal::TerminalConsole;

#[derive(Parser)]
#[command(name = "tollgate")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Chat with remote tools; pauses for authorization and approval", long_about = None)]
struct Cli {}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _cli = Cli::parse();

    // Default to warn so logs do not interleave with the prompt; RUST_LOG overrides
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;

    let client = ArcadeClient::with_base_url(config.arcade_api_key.clone(), &config.arcade_base_url)?;
    let tool_service = Arc::new(ArcadeToolService::new(client.clone()));
    let authorizer = Arc::new(ArcadeAuthorizer::new(client));

    let tools = tool_service
        .fetch(
            &config.user_id,
            &config.toolkits,
            &config.isolated_tools,
            config.tool_limit,
        )
        .await
        .context("Failed to fetch tools")?;
    info!(count = tools.len(), model = %config.model, "Tools ready");

    let spec = AgentSpec {
        system_prompt: config.system_prompt.clone(),
        tools: ToolSet::new(tools),
        user_id: config.user_id.clone(),
        confirmation: ConfirmationPolicy::new(&config.confirm_tools),
        max_steps: config.max_steps,
    };
    let agent = ToolAgent::new(
        spec,
        Arc::new(GenAiModel::new(config.model.clone())),
        tool_service,
        authorizer.clone(),
        Arc::new(MemoryCheckpointer::new()),
    );

    let mut console = TerminalConsole::new()?;
    let mut chat = ConversationLoop::new(&config, Arc::new(agent), authorizer);
    chat.run(&mut console).await?;

    Ok(())
}
