//! Conversation state owned by the caller and passed explicitly.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

use super::state::ApprovalState;
use crate::decision::{DecisionKind, ToolCallRequest};
use crate::error::{MailgateError, Result};
use crate::runtime::RuntimeResponse;

/// Opaque key correlating every invoke/resume call of one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(String);

impl ThreadId {
    /// Mint a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ThreadId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ThreadId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ThreadId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One rendered line of the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            at: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            at: Utc::now(),
        }
    }
}

/// History, pending call and approval state of one conversation.
///
/// `pending` is set exactly when the last runtime response was a suspension.
/// Every mutation goes through [`apply_invoke`](Self::apply_invoke) or
/// [`apply_resume`](Self::apply_resume). A request refused up front leaves
/// every field untouched; a runtime answer is never dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    thread_id: ThreadId,
    history: Vec<Turn>,
    pending: Option<ToolCallRequest>,
    approval: ApprovalState,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationState {
    /// Start a conversation with a freshly minted thread id.
    pub fn new() -> Self {
        Self::with_thread_id(ThreadId::new())
    }

    pub fn with_thread_id(thread_id: ThreadId) -> Self {
        Self {
            thread_id,
            history: Vec::new(),
            pending: None,
            approval: ApprovalState::Idle,
        }
    }

    /// Rebuild a conversation from stored history. A stored pending call
    /// puts the conversation back into `AwaitingDecision`.
    pub fn restore(
        thread_id: ThreadId,
        history: Vec<Turn>,
        pending: Option<ToolCallRequest>,
    ) -> Self {
        let approval = if pending.is_some() {
            ApprovalState::AwaitingDecision
        } else {
            ApprovalState::Idle
        };
        Self {
            thread_id,
            history,
            pending,
            approval,
        }
    }

    pub fn thread_id(&self) -> &ThreadId {
        &self.thread_id
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn pending(&self) -> Option<&ToolCallRequest> {
        self.pending.as_ref()
    }

    pub fn approval_state(&self) -> ApprovalState {
        self.approval
    }

    /// Record a user message and the runtime's answer to it.
    pub fn apply_invoke(&mut self, user_text: &str, response: RuntimeResponse) -> Result<()> {
        if self.approval.is_awaiting_decision() {
            return Err(MailgateError::InvalidState(
                "a tool call is awaiting a decision; approve, reject or edit it first".into(),
            ));
        }
        let next = next_state(self.approval, &response)?;
        self.history.push(Turn::user(user_text));
        self.commit(next, response);
        Ok(())
    }

    /// Record the runtime's answer to a resume carrying a `kind` decision.
    ///
    /// If the answer is not a legal follow-up to `kind` (a new suspension
    /// right after a rejection) it is still recorded, so `pending` keeps
    /// matching the runtime, and `InvalidState` is returned.
    pub fn apply_resume(&mut self, kind: DecisionKind, response: RuntimeResponse) -> Result<()> {
        if self.pending.is_none() {
            return Err(MailgateError::invalid_decision(
                "no tool call is awaiting a decision",
            ));
        }
        let resolved = self.approval.resolve(kind)?;
        match next_state(resolved, &response) {
            Ok(next) => {
                self.commit(next, response);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(
                    thread_id = %self.thread_id,
                    error = %err,
                    "recording out-of-order runtime response"
                );
                self.adopt(response);
                Err(err)
            }
        }
    }

    fn adopt(&mut self, response: RuntimeResponse) {
        let next = if response.is_suspended() {
            ApprovalState::AwaitingDecision
        } else {
            ApprovalState::Idle
        };
        self.commit(next, response);
    }

    fn commit(&mut self, next: ApprovalState, response: RuntimeResponse) {
        match response {
            RuntimeResponse::Final { message } => {
                self.history.push(Turn::assistant(message));
                self.pending = None;
            }
            RuntimeResponse::Suspended { request } => {
                self.history.push(Turn::assistant(request.to_string()));
                self.pending = Some(request);
            }
        }
        self.approval = next;
    }
}

fn next_state(from: ApprovalState, response: &RuntimeResponse) -> Result<ApprovalState> {
    match response {
        RuntimeResponse::Final { .. } => from.finish(),
        RuntimeResponse::Suspended { .. } => from.suspend(),
    }
}
