//! Turning interruptions into decisions

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::auth::AuthorizationService;
use crate::conversation::console::{Console, Notice};
use crate::interrupt::{Decision, Interruption};

/// Question put to the user for approval interruptions
pub const APPROVAL_QUESTION: &str = "Do you approve this tool call?";

/// Resolves one interruption at a time
#[derive(Clone)]
pub struct InterruptResolver {
    authorizer: Arc<dyn AuthorizationService>,
}

impl InterruptResolver {
    pub fn new(authorizer: Arc<dyn AuthorizationService>) -> Self {
        Self { authorizer }
    }

    /// Produce the decision for one interruption. Never fails: every
    /// problem along the way is reported and becomes a denial.
    pub async fn resolve(&self, interruption: &Interruption, console: &mut dyn Console) -> Decision {
        debug!(
            kind = interruption.kind(),
            tool = interruption.tool_name().unwrap_or("-"),
            "Resolving interruption"
        );
        match interruption {
            Interruption::AuthorizationRequired { tool_name, challenge } => {
                console.show(Notice::AuthorizationRequired {
                    tool_name,
                    url: &challenge.url,
                });
                console.show(Notice::AwaitingAuthorization);

                match self.authorizer.wait_for_completion(&challenge.id).await {
                    Ok(()) => {
                        info!(tool = %tool_name, "Authorization granted");
                        console.show(Notice::AuthorizationGranted);
                        Decision::approved()
                    }
                    Err(e) => {
                        warn!(tool = %tool_name, error = %e, "Authorization wait failed");
                        console.show(Notice::AuthorizationFailed {
                            error: &e.to_string(),
                        });
                        Decision::denied()
                    }
                }
            }
            Interruption::ApprovalRequired { tool_name, input } => {
                console.show(Notice::ApprovalRequired { tool_name, input });
                match console.confirm(APPROVAL_QUESTION) {
                    Ok(approved) => {
                        info!(tool = %tool_name, approved, "Approval answered");
                        Decision::from(approved)
                    }
                    Err(e) => {
                        warn!(tool = %tool_name, error = %e, "Approval prompt failed, denying");
                        Decision::denied()
                    }
                }
            }
            Interruption::Unrecognized { value } => {
                warn!(payload = %value, "Unrecognized interruption, denying");
                console.show(Notice::UnsupportedInterruption);
                Decision::denied()
            }
        }
    }
}
