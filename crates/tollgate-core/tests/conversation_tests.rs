//! Conversation loop integration tests
//!
//! The runtime, authorization service, and console are scripted fakes, so
//! these tests cover the loop's own logic: pass counting, positional
//! decisions, failure recovery, and exit handling.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use serde_json::json;

use tollgate_core::config::{ENV_API_KEY, ENV_MODEL, ENV_USER_ID};
use tollgate_core::runtime::UpdateStream;
use tollgate_core::{
    AgentMessage, AgentRuntime, AgentUpdate, AuthChallenge, AuthCheck, AuthorizationService, Config,
    Console, ConversationLoop, Decision, Error, Interruption, Notice, Result, Resume, RunConfig,
    Settings, TurnInput, TurnState,
};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// Plays back one list of updates per pass and records every invocation
#[derive(Default)]
struct ScriptedRuntime {
    passes: Mutex<VecDeque<Vec<Result<AgentUpdate>>>>,
    inputs: Mutex<Vec<TurnInput>>,
    sessions: Mutex<Vec<String>>,
}

impl ScriptedRuntime {
    fn new(passes: Vec<Vec<Result<AgentUpdate>>>) -> Arc<Self> {
        Arc::new(Self {
            passes: Mutex::new(passes.into()),
            ..Self::default()
        })
    }

    fn inputs(&self) -> Vec<TurnInput> {
        self.inputs.lock().clone()
    }

    fn invocations(&self) -> usize {
        self.inputs.lock().len()
    }
}

#[async_trait]
impl AgentRuntime for ScriptedRuntime {
    async fn stream(&self, input: TurnInput, config: &RunConfig) -> Result<UpdateStream> {
        self.inputs.lock().push(input);
        self.sessions.lock().push(config.session_id.clone());
        let updates = self
            .passes
            .lock()
            .pop_front()
            .ok_or_else(|| Error::Runtime("no scripted pass left".into()))?;
        Ok(futures::stream::iter(updates).boxed())
    }
}

/// Completes every challenge except the ones listed as failing
#[derive(Default)]
struct FakeAuthorizer {
    failing: HashSet<String>,
    waited: Mutex<Vec<String>>,
}

impl FakeAuthorizer {
    fn failing(ids: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            failing: ids.iter().map(|s| s.to_string()).collect(),
            waited: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl AuthorizationService for FakeAuthorizer {
    async fn authorize(&self, _tool_name: &str, _user_id: &str) -> Result<AuthCheck> {
        Ok(AuthCheck::Authorized)
    }

    async fn wait_for_completion(&self, challenge_id: &str) -> Result<()> {
        self.waited.lock().push(challenge_id.to_string());
        if self.failing.contains(challenge_id) {
            Err(Error::Authorization(format!("challenge {} failed", challenge_id)))
        } else {
            Ok(())
        }
    }
}

/// Feeds lines and yes/no answers; records what was shown
#[derive(Default)]
struct ScriptedConsole {
    lines: VecDeque<String>,
    answers: VecDeque<bool>,
    questions: Vec<String>,
    shown: Vec<String>,
}

impl ScriptedConsole {
    fn new(lines: &[&str], answers: &[bool]) -> Self {
        Self {
            lines: lines.iter().map(|s| s.to_string()).collect(),
            answers: answers.iter().copied().collect(),
            ..Self::default()
        }
    }

    fn saw(&self, needle: &str) -> bool {
        self.shown.iter().any(|s| s.contains(needle))
    }
}

impl Console for ScriptedConsole {
    fn read_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        Ok(self.lines.pop_front())
    }

    fn confirm(&mut self, question: &str) -> Result<bool> {
        self.questions.push(question.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| Error::Console("input closed".into()))
    }

    fn show(&mut self, notice: Notice<'_>) {
        self.shown.push(format!("{:?}", notice));
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn config() -> Config {
    let lookup = |name: &str| match name {
        ENV_USER_ID => Some("user@example.com".to_string()),
        ENV_MODEL => Some("gpt-4o".to_string()),
        ENV_API_KEY => Some("arc_test".to_string()),
        _ => None,
    };
    Config::from_sources(Settings::default(), lookup).expect("config")
}

fn conversation(runtime: &Arc<ScriptedRuntime>, authorizer: &Arc<FakeAuthorizer>) -> ConversationLoop {
    ConversationLoop::new(&config(), runtime.clone(), authorizer.clone())
}

fn reply(text: &str) -> Result<AgentUpdate> {
    Ok(AgentUpdate::Message(AgentMessage::Assistant {
        content: text.to_string(),
        tool_calls: Vec::new(),
    }))
}

fn interrupt(list: Vec<Interruption>) -> Result<AgentUpdate> {
    Ok(AgentUpdate::Interrupt(list))
}

fn auth(tool: &str, id: &str) -> Interruption {
    Interruption::authorization(
        tool,
        AuthChallenge {
            id: id.to_string(),
            url: format!("https://auth.example.com/{}", id),
        },
    )
}

fn approval(tool: &str) -> Interruption {
    Interruption::approval(tool, json!({ "text": "hello" }))
}

// ---------------------------------------------------------------------------
// Turns
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_turn_without_interruptions_is_one_pass() {
    let runtime = ScriptedRuntime::new(vec![vec![reply("Here is the news.")]]);
    let authorizer = FakeAuthorizer::failing(&[]);
    let mut chat = conversation(&runtime, &authorizer);
    let mut console = ScriptedConsole::default();

    let summary = chat.run_turn("what's new?", &mut console).await.unwrap();

    assert_eq!(summary.passes, 1);
    assert!(summary.decisions.is_empty());
    assert_eq!(runtime.inputs(), vec![TurnInput::message("what's new?")]);
    assert!(console.saw("Here is the news."));
    assert_eq!(chat.state(), TurnState::AwaitingInput);
}

#[tokio::test]
async fn test_each_interrupted_pass_is_resumed() {
    let runtime = ScriptedRuntime::new(vec![
        vec![reply("Checking"), interrupt(vec![auth("Gmail_SendEmail", "ch1"), approval("Slack_SendMessage")])],
        vec![interrupt(vec![approval("Slack_SendMessage")])],
        vec![reply("All done")],
    ]);
    let authorizer = FakeAuthorizer::failing(&[]);
    let mut chat = conversation(&runtime, &authorizer);
    let mut console = ScriptedConsole::new(&[], &[true, false]);

    let summary = chat.run_turn("send it", &mut console).await.unwrap();

    // Two interrupted passes, then the finishing one
    assert_eq!(summary.passes, 3);
    assert_eq!(runtime.invocations(), 3);
    assert_eq!(
        runtime.inputs(),
        vec![
            TurnInput::message("send it"),
            TurnInput::resume(Resume::Multiple(vec![Decision::approved(), Decision::approved()])),
            TurnInput::resume(Resume::Single(Decision::denied())),
        ]
    );
    assert_eq!(summary.decisions[0].len(), 2);
    assert_eq!(summary.decisions[1].len(), 1);
    assert_eq!(*authorizer.waited.lock(), vec!["ch1"]);
    assert_eq!(console.questions.len(), 2);
}

#[tokio::test]
async fn test_decisions_keep_interruption_order() {
    let runtime = ScriptedRuntime::new(vec![
        vec![interrupt(vec![
            approval("A_One"),
            auth("B_Two", "bad"),
            approval("C_Three"),
            auth("D_Four", "good"),
        ])],
        vec![reply("ok")],
    ]);
    let authorizer = FakeAuthorizer::failing(&["bad"]);
    let mut chat = conversation(&runtime, &authorizer);
    let mut console = ScriptedConsole::new(&[], &[false, true]);

    chat.run_turn("go", &mut console).await.unwrap();

    assert_eq!(
        runtime.inputs()[1],
        TurnInput::resume(Resume::Multiple(vec![
            Decision::denied(),
            Decision::denied(),
            Decision::approved(),
            Decision::approved(),
        ]))
    );
    assert_eq!(*authorizer.waited.lock(), vec!["bad", "good"]);
}

#[tokio::test]
async fn test_failed_authorization_wait_is_denied() {
    let runtime = ScriptedRuntime::new(vec![
        vec![interrupt(vec![auth("Gmail_SendEmail", "ch1")])],
        vec![reply("Could not send without access.")],
    ]);
    let authorizer = FakeAuthorizer::failing(&["ch1"]);
    let mut chat = conversation(&runtime, &authorizer);
    let mut console = ScriptedConsole::default();

    let summary = chat.run_turn("email bob", &mut console).await.unwrap();

    assert_eq!(summary.decisions, vec![Resume::Single(Decision::denied())]);
    assert!(console.saw("AuthorizationFailed"));
    assert!(console.saw("https://auth.example.com/ch1"));
}

#[tokio::test]
async fn test_declined_approval_is_passed_through() {
    let runtime = ScriptedRuntime::new(vec![
        vec![interrupt(vec![approval("Slack_SendMessage")])],
        vec![reply("Not sent.")],
    ]);
    let authorizer = FakeAuthorizer::failing(&[]);
    let mut chat = conversation(&runtime, &authorizer);
    let mut console = ScriptedConsole::new(&[], &[false]);

    let summary = chat.run_turn("post hello", &mut console).await.unwrap();

    assert_eq!(summary.decisions, vec![Resume::Single(Decision::denied())]);
    assert_eq!(console.questions, vec![tollgate_core::conversation::APPROVAL_QUESTION]);
    assert!(console.saw("Slack_SendMessage"));
}

#[tokio::test]
async fn test_unanswerable_approval_is_denied() {
    let runtime = ScriptedRuntime::new(vec![
        vec![interrupt(vec![approval("Slack_SendMessage")])],
        vec![reply("Not sent.")],
    ]);
    let authorizer = FakeAuthorizer::failing(&[]);
    let mut chat = conversation(&runtime, &authorizer);
    // No answers scripted: the confirm prompt errors
    let mut console = ScriptedConsole::default();

    let summary = chat.run_turn("post hello", &mut console).await.unwrap();
    assert_eq!(summary.decisions, vec![Resume::Single(Decision::denied())]);
}

#[tokio::test]
async fn test_unrecognized_interruption_is_denied() {
    let unknown = Interruption::from_value(&json!({ "budget_exceeded": true }));
    let runtime = ScriptedRuntime::new(vec![
        vec![interrupt(vec![unknown, approval("Slack_SendMessage")])],
        vec![reply("ok")],
    ]);
    let authorizer = FakeAuthorizer::failing(&[]);
    let mut chat = conversation(&runtime, &authorizer);
    let mut console = ScriptedConsole::new(&[], &[true]);

    let summary = chat.run_turn("go", &mut console).await.unwrap();

    assert_eq!(
        summary.decisions,
        vec![Resume::Multiple(vec![Decision::denied(), Decision::approved()])]
    );
    assert!(console.saw("UnsupportedInterruption"));
    assert!(authorizer.waited.lock().is_empty());
}

#[tokio::test]
async fn test_deltas_are_shown() {
    let runtime = ScriptedRuntime::new(vec![vec![
        Ok(AgentUpdate::Delta("Hel".into())),
        Ok(AgentUpdate::Delta("lo".into())),
    ]]);
    let authorizer = FakeAuthorizer::failing(&[]);
    let mut chat = conversation(&runtime, &authorizer);
    let mut console = ScriptedConsole::default();

    chat.run_turn("hi", &mut console).await.unwrap();
    assert!(console.saw("Delta(\"Hel\")"));
    assert!(console.saw("Delta(\"lo\")"));
}

// ---------------------------------------------------------------------------
// Session loop
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_exit_in_any_case_stops_without_invoking_runtime() {
    for word in ["exit", "EXIT", "Exit", "eXiT"] {
        let runtime = ScriptedRuntime::new(vec![]);
        let authorizer = FakeAuthorizer::failing(&[]);
        let mut chat = conversation(&runtime, &authorizer);
        let mut console = ScriptedConsole::new(&[word, "never read"], &[]);

        chat.run(&mut console).await.unwrap();

        assert_eq!(runtime.invocations(), 0);
        assert_eq!(console.lines.len(), 1);
        assert!(console.saw("Welcome"));
        assert!(console.saw("Goodbye"));
    }
}

#[tokio::test]
async fn test_end_of_input_ends_session() {
    let runtime = ScriptedRuntime::new(vec![vec![reply("hi there")]]);
    let authorizer = FakeAuthorizer::failing(&[]);
    let mut chat = conversation(&runtime, &authorizer);
    let mut console = ScriptedConsole::new(&["hello"], &[]);

    chat.run(&mut console).await.unwrap();

    assert_eq!(runtime.invocations(), 1);
    assert!(console.saw("Goodbye"));
}

#[tokio::test]
async fn test_failed_turn_does_not_end_session() {
    let runtime = ScriptedRuntime::new(vec![
        vec![reply("partial"), Err(Error::Provider("model unavailable".into()))],
        vec![reply("second answer")],
    ]);
    let authorizer = FakeAuthorizer::failing(&[]);
    let mut chat = conversation(&runtime, &authorizer);
    let session = chat.session_id().to_string();
    let mut console = ScriptedConsole::new(&["first", "second", "exit"], &[]);

    chat.run(&mut console).await.unwrap();

    assert_eq!(runtime.invocations(), 2);
    assert!(console.saw("TurnFailed"));
    assert!(console.saw("model unavailable"));
    assert!(console.saw("second answer"));
    assert_eq!(chat.session_id(), session);
    assert!(runtime.sessions.lock().iter().all(|s| *s == session));
    assert_eq!(chat.state(), TurnState::AwaitingInput);
}

#[tokio::test]
async fn test_runtime_refusing_to_start_is_reported() {
    // No scripted passes: the runtime errors before streaming
    let runtime = ScriptedRuntime::new(vec![]);
    let authorizer = FakeAuthorizer::failing(&[]);
    let mut chat = conversation(&runtime, &authorizer);
    let mut console = ScriptedConsole::new(&["hello", "exit"], &[]);

    chat.run(&mut console).await.unwrap();

    assert_eq!(runtime.invocations(), 1);
    assert!(console.saw("no scripted pass left"));
}

#[tokio::test]
async fn test_empty_line_is_a_message() {
    let runtime = ScriptedRuntime::new(vec![vec![reply("?")]]);
    let authorizer = FakeAuthorizer::failing(&[]);
    let mut chat = conversation(&runtime, &authorizer);
    let mut console = ScriptedConsole::new(&["", "exit"], &[]);

    chat.run(&mut console).await.unwrap();

    assert_eq!(runtime.inputs(), vec![TurnInput::message("")]);
}
