//! Shared test helpers and a scripted runtime.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use mailgate::decision::{DecisionProtocol, ResumePayload, ToolCallRequest};
use mailgate::error::{MailgateError, Result};
use mailgate::runtime::{AgentRuntime, RuntimeResponse};
use mailgate::session::ThreadId;
use mailgate::tools::builtin::all_tools;
use mailgate::tools::{Outbox, ToolArgs, SEND_EMAIL};

/// A call the scripted runtime received.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Invoke { thread_id: ThreadId, message: String },
    Resume { thread_id: ThreadId, payload: ResumePayload },
}

/// An [`AgentRuntime`] that answers from a queue and records every call.
#[derive(Default)]
pub struct ScriptedRuntime {
    responses: Mutex<VecDeque<Result<RuntimeResponse>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a suspension on `request`.
    pub fn then_suspend(self, request: ToolCallRequest) -> Self {
        self.push(Ok(RuntimeResponse::Suspended { request }))
    }

    /// Queue a final assistant message.
    pub fn then_reply(self, message: &str) -> Self {
        self.push(Ok(RuntimeResponse::Final {
            message: message.to_string(),
        }))
    }

    /// Queue a runtime failure.
    pub fn then_fail(self, message: &str) -> Self {
        self.push(Err(MailgateError::runtime(message)))
    }

    fn push(self, response: Result<RuntimeResponse>) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn resume_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, RecordedCall::Resume { .. }))
            .count()
    }

    fn next(&self) -> Result<RuntimeResponse> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(MailgateError::runtime("no scripted response left")))
    }
}

#[async_trait]
impl AgentRuntime for ScriptedRuntime {
    async fn invoke(&self, thread_id: &ThreadId, message: &str) -> Result<RuntimeResponse> {
        self.calls.lock().unwrap().push(RecordedCall::Invoke {
            thread_id: thread_id.clone(),
            message: message.to_string(),
        });
        self.next()
    }

    async fn resume(
        &self,
        thread_id: &ThreadId,
        payload: &ResumePayload,
    ) -> Result<RuntimeResponse> {
        self.calls.lock().unwrap().push(RecordedCall::Resume {
            thread_id: thread_id.clone(),
            payload: payload.clone(),
        });
        self.next()
    }
}

pub fn email_args(recipient: &str, subject: &str, body: &str) -> ToolArgs {
    let mut args = ToolArgs::new();
    args.insert("recipient".into(), recipient.into());
    args.insert("subject".into(), subject.into());
    args.insert("body".into(), body.into());
    args
}

/// `send_email` to a@x.com, subject "Hi", body "Hello".
pub fn pending_email() -> ToolCallRequest {
    ToolCallRequest::new(SEND_EMAIL, email_args("a@x.com", "Hi", "Hello")).with_id("call_1")
}

pub fn protocol() -> DecisionProtocol {
    DecisionProtocol::new(all_tools(&Outbox::new()))
}
