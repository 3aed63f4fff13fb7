//! Interruptions, decisions, and turn inputs
//!
//! A runtime pass stops with one or more interruptions when a tool call needs
//! the user's authorization or approval. Each interruption is answered with
//! one [`Decision`]; the decisions are sent back as a [`Resume`] payload in the
//! order the interruptions were received, since the runtime matches them up
//! by position.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Challenge handed out by the authorization service for one tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthChallenge {
    /// Opaque id used to wait on the challenge
    pub id: String,
    /// Where the user completes the authorization
    pub url: String,
}

/// A runtime-raised suspension of a tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Interruption {
    /// The tool needs the user to authorize access (`authorization_required`)
    AuthorizationRequired {
        tool_name: String,
        challenge: AuthChallenge,
    },
    /// The tool call needs the user's approval (`hitl_required`)
    ApprovalRequired { tool_name: String, input: Value },
    /// Anything else; always resolved as denied
    Unrecognized { value: Value },
}

impl Interruption {
    pub fn authorization(tool_name: impl Into<String>, challenge: AuthChallenge) -> Self {
        Self::AuthorizationRequired {
            tool_name: tool_name.into(),
            challenge,
        }
    }

    pub fn approval(tool_name: impl Into<String>, input: Value) -> Self {
        Self::ApprovalRequired {
            tool_name: tool_name.into(),
            input,
        }
    }

    /// Parse the flag-style payload runtimes put on an interrupt:
    ///
    /// ```text
    /// {"authorization_required": true, "tool_name": "..", "authorization_response": {"id": "..", "url": ".."}}
    /// {"hitl_required": true, "tool_name": "..", "input": {..}}
    /// ```
    ///
    /// `authorization_required` wins when both flags are set. A payload with
    /// neither flag, or an authorization payload without a challenge id, is
    /// `Unrecognized`.
    pub fn from_value(value: &Value) -> Self {
        let flag = |key: &str| value.get(key).and_then(Value::as_bool).unwrap_or(false);
        let tool_name = value
            .get("tool_name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        if flag("authorization_required") {
            let response = value.get("authorization_response");
            let field = |key: &str| {
                response
                    .and_then(|r| r.get(key))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            };
            return match field("id") {
                Some(id) => Self::authorization(
                    tool_name,
                    AuthChallenge {
                        id,
                        url: field("url").unwrap_or_default(),
                    },
                ),
                None => Self::Unrecognized {
                    value: value.clone(),
                },
            };
        }

        if flag("hitl_required") {
            let input = value.get("input").cloned().unwrap_or(Value::Null);
            return Self::approval(tool_name, input);
        }

        Self::Unrecognized {
            value: value.clone(),
        }
    }

    /// Tool the interruption is about, if known
    pub fn tool_name(&self) -> Option<&str> {
        match self {
            Self::AuthorizationRequired { tool_name, .. } | Self::ApprovalRequired { tool_name, .. } => {
                Some(tool_name)
            }
            Self::Unrecognized { .. } => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::AuthorizationRequired { .. } => "authorization_required",
            Self::ApprovalRequired { .. } => "hitl_required",
            Self::Unrecognized { .. } => "unrecognized",
        }
    }
}

/// Outcome for one interruption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub authorized: bool,
}

impl Decision {
    pub fn approved() -> Self {
        Self { authorized: true }
    }

    pub fn denied() -> Self {
        Self { authorized: false }
    }
}

impl From<bool> for Decision {
    fn from(authorized: bool) -> Self {
        Self { authorized }
    }
}

/// Decisions sent back to resume a pass.
///
/// Serializes as a bare decision object for `Single` and as an array for
/// `Multiple`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Resume {
    Single(Decision),
    Multiple(Vec<Decision>),
}

impl Resume {
    /// `Single` for exactly one decision, otherwise `Multiple` in order
    pub fn from_decisions(mut decisions: Vec<Decision>) -> Self {
        if decisions.len() == 1 {
            if let Some(decision) = decisions.pop() {
                return Self::Single(decision);
            }
        }
        Self::Multiple(decisions)
    }

    pub fn decisions(&self) -> &[Decision] {
        match self {
            Self::Single(decision) => std::slice::from_ref(decision),
            Self::Multiple(decisions) => decisions,
        }
    }

    pub fn into_decisions(self) -> Vec<Decision> {
        match self {
            Self::Single(decision) => vec![decision],
            Self::Multiple(decisions) => decisions,
        }
    }

    pub fn len(&self) -> usize {
        self.decisions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions().is_empty()
    }
}

/// What a runtime pass is started with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnInput {
    /// A new user message
    Message { content: String },
    /// Decisions for the interruptions of the previous pass
    Resume { resume: Resume },
}

impl TurnInput {
    pub fn message(content: impl Into<String>) -> Self {
        Self::Message {
            content: content.into(),
        }
    }

    pub fn resume(resume: Resume) -> Self {
        Self::Resume { resume }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_authorization_payload() {
        let parsed = Interruption::from_value(&json!({
            "authorization_required": true,
            "tool_name": "Gmail_SendEmail",
            "authorization_response": { "id": "ac_1", "url": "https://auth.example.com/ac_1" }
        }));

        assert_eq!(
            parsed,
            Interruption::authorization(
                "Gmail_SendEmail",
                AuthChallenge {
                    id: "ac_1".into(),
                    url: "https://auth.example.com/ac_1".into(),
                }
            )
        );
        assert_eq!(parsed.kind(), "authorization_required");
    }

    #[test]
    fn test_parse_hitl_payload() {
        let parsed = Interruption::from_value(&json!({
            "hitl_required": true,
            "tool_name": "Slack_SendMessage",
            "input": { "channel": "#general", "text": "hi" }
        }));

        match parsed {
            Interruption::ApprovalRequired { tool_name, input } => {
                assert_eq!(tool_name, "Slack_SendMessage");
                assert_eq!(input["channel"], "#general");
            }
            other => panic!("Expected ApprovalRequired, got {:?}", other),
        }
    }

    #[test]
    fn test_authorization_flag_wins() {
        let parsed = Interruption::from_value(&json!({
            "authorization_required": true,
            "hitl_required": true,
            "tool_name": "X",
            "authorization_response": { "id": "a" }
        }));
        assert!(matches!(parsed, Interruption::AuthorizationRequired { .. }));
    }

    #[test]
    fn test_parse_unrecognized_payloads() {
        let no_flags = Interruption::from_value(&json!({ "tool_name": "X" }));
        assert!(matches!(no_flags, Interruption::Unrecognized { .. }));
        assert_eq!(no_flags.tool_name(), None);

        let false_flags = Interruption::from_value(&json!({
            "authorization_required": false,
            "hitl_required": false
        }));
        assert!(matches!(false_flags, Interruption::Unrecognized { .. }));

        let no_challenge = Interruption::from_value(&json!({
            "authorization_required": true,
            "tool_name": "X"
        }));
        assert!(matches!(no_challenge, Interruption::Unrecognized { .. }));
    }

    #[test]
    fn test_resume_shape() {
        let single = Resume::from_decisions(vec![Decision::approved()]);
        assert_eq!(single, Resume::Single(Decision::approved()));
        assert_eq!(single.len(), 1);

        let multiple = Resume::from_decisions(vec![Decision::denied(), Decision::approved()]);
        assert_eq!(
            multiple.decisions(),
            &[Decision::denied(), Decision::approved()]
        );
        assert_eq!(multiple.clone().into_decisions().len(), 2);
    }

    #[test]
    fn test_resume_wire_form() {
        let single = Resume::Single(Decision::approved());
        assert_eq!(serde_json::to_value(&single).unwrap(), json!({ "authorized": true }));

        let multiple = Resume::Multiple(vec![Decision::approved(), Decision::denied()]);
        assert_eq!(
            serde_json::to_value(&multiple).unwrap(),
            json!([{ "authorized": true }, { "authorized": false }])
        );

        let parsed: Resume = serde_json::from_value(json!([{ "authorized": false }])).unwrap();
        assert_eq!(parsed, Resume::Multiple(vec![Decision::denied()]));
    }
}
