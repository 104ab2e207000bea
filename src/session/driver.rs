//! Drives one conversation through invoke / decide / resume.

use crate::decision::{DecisionInput, DecisionKind, DecisionProtocol, ResumePayload};
use crate::error::{MailgateError, Result};
use crate::runtime::{AgentRuntime, RuntimeResponse};

use super::conversation::ConversationState;

/// One conversation with an agent runtime.
///
/// Methods take `&mut self`, so a session never has two calls in flight.
/// State only changes after the runtime answered successfully; a failed
/// invoke or resume leaves the conversation as it was. Once the runtime has
/// answered, its answer is recorded even when the transition is reported as
/// invalid.
pub struct ChatSession<R> {
    runtime: R,
    protocol: DecisionProtocol,
    state: ConversationState,
}

impl<R: AgentRuntime> ChatSession<R> {
    pub fn new(runtime: R, protocol: DecisionProtocol) -> Self {
        Self::with_state(runtime, protocol, ConversationState::new())
    }

    pub fn with_state(runtime: R, protocol: DecisionProtocol, state: ConversationState) -> Self {
        Self {
            runtime,
            protocol,
            state,
        }
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn protocol(&self) -> &DecisionProtocol {
        &self.protocol
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// End the session, handing back its state.
    pub fn into_state(self) -> ConversationState {
        self.state
    }

    /// Send a user message to the agent.
    pub async fn send(&mut self, text: &str) -> Result<RuntimeResponse> {
        if self.state.approval_state().is_awaiting_decision() {
            return Err(MailgateError::InvalidState(
                "a tool call is awaiting a decision; approve, reject or edit it first".into(),
            ));
        }
        let thread_id = self.state.thread_id().clone();
        tracing::debug!(thread_id = %thread_id, "invoking runtime");
        let response = self.runtime.invoke(&thread_id, text).await?;
        self.state.apply_invoke(text, response.clone())?;
        Ok(response)
    }

    /// Resolve the pending tool call.
    ///
    /// The payload is built and validated before anything is sent; on a
    /// validation error the runtime is never called.
    pub async fn decide(
        &mut self,
        kind: DecisionKind,
        input: DecisionInput,
    ) -> Result<RuntimeResponse> {
        let payload = self
            .protocol
            .build_resume(kind, self.state.pending(), input)?;
        self.resume_with(kind, payload).await
    }

    /// Resume with a payload built elsewhere (e.g. parsed from JSON).
    pub async fn resume(&mut self, payload: ResumePayload) -> Result<RuntimeResponse> {
        self.protocol.validate(&payload, self.state.pending())?;
        let kind = payload
            .sole_decision()
            .map(|decision| decision.kind())
            .ok_or_else(|| MailgateError::invalid_decision("empty payload"))?;
        self.resume_with(kind, payload).await
    }

    async fn resume_with(
        &mut self,
        kind: DecisionKind,
        payload: ResumePayload,
    ) -> Result<RuntimeResponse> {
        let thread_id = self.state.thread_id().clone();
        tracing::debug!(thread_id = %thread_id, decision = %kind, "resuming runtime");
        let response = self.runtime.resume(&thread_id, &payload).await?;
        self.state.apply_resume(kind, response.clone())?;
        Ok(response)
    }
}
