//! In-process runtime that suspends before guarded tool calls.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::checkpoint::{Checkpoint, Checkpointer, InMemoryCheckpointer};
use super::planner::{Plan, Planner, ToolOutcome};
use super::{AgentRuntime, RuntimeResponse};
use crate::decision::{Decision, InterruptPolicy, ResumePayload, ToolCallRequest};
use crate::error::{MailgateError, Result};
use crate::session::{ThreadId, Turn};
use crate::tools::{validate_arguments, ToolArguments, ToolExecutionContext, ToolRegistry};

/// Offline [`AgentRuntime`]: a [`Planner`] proposes, the interrupt policy
/// decides whether to pause, and tools run only after approval.
///
/// Every call loads the thread's [`Checkpoint`], works on it, and saves it
/// back, so a runtime rebuilt over the same [`Checkpointer`] picks up a
/// suspended thread where it stopped.
pub struct LocalRuntime {
    planner: Arc<dyn Planner>,
    tools: ToolRegistry,
    policy: InterruptPolicy,
    checkpointer: Arc<dyn Checkpointer>,
    confirm_edits: bool,
    in_flight: Mutex<HashSet<ThreadId>>,
}

impl LocalRuntime {
    /// Runtime guarding every registered tool, with in-memory checkpoints.
    pub fn new(tools: ToolRegistry, planner: Arc<dyn Planner>) -> Self {
        let policy = tools
            .names()
            .into_iter()
            .fold(InterruptPolicy::new(), |policy, name| policy.guard(name));
        Self {
            planner,
            tools,
            policy,
            checkpointer: Arc::new(InMemoryCheckpointer::new()),
            confirm_edits: false,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_policy(mut self, policy: InterruptPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_checkpointer(mut self, checkpointer: Arc<dyn Checkpointer>) -> Self {
        self.checkpointer = checkpointer;
        self
    }

    /// Send edited calls back for another approval instead of running them.
    pub fn with_confirm_edits(mut self, confirm_edits: bool) -> Self {
        self.confirm_edits = confirm_edits;
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn policy(&self) -> &InterruptPolicy {
        &self.policy
    }

    fn begin_turn(&self, thread_id: &ThreadId) -> Result<TurnGuard<'_>> {
        let mut in_flight = self
            .in_flight
            .lock()
            .map_err(|_| MailgateError::runtime("turn registry lock poisoned"))?;
        if !in_flight.insert(thread_id.clone()) {
            return Err(MailgateError::InvalidState(format!(
                "thread {thread_id} already has a turn in flight"
            )));
        }
        Ok(TurnGuard {
            in_flight: &self.in_flight,
            thread_id: thread_id.clone(),
        })
    }

    async fn execute(&self, thread_id: &ThreadId, call: ToolCallRequest) -> ToolOutcome {
        let Some(tool) = self.tools.get(&call.name) else {
            let error = format!("tool `{}` is not registered", call.name);
            return ToolOutcome::Failed { call, error };
        };

        let args = serde_json::Value::Object(call.args.clone());
        if let Err(error) = validate_arguments(&args, &tool.parameters().schema) {
            return ToolOutcome::Failed {
                call,
                error: format!("invalid arguments: {error}"),
            };
        }

        let ctx = ToolExecutionContext::for_call(thread_id.to_string(), &call.id);
        match tool.execute(&ToolArguments::new(call.args.clone()), &ctx).await {
            Ok(confirmation) => ToolOutcome::Executed { call, confirmation },
            Err(err) => {
                tracing::warn!(
                    thread_id = %thread_id,
                    tool = %call.name,
                    error = %err,
                    "tool failed"
                );
                ToolOutcome::Failed {
                    call,
                    error: err.to_string(),
                }
            }
        }
    }

    async fn finish_call(&self, thread_id: &ThreadId, call: ToolCallRequest) -> RuntimeResponse {
        let outcome = self.execute(thread_id, call).await;
        RuntimeResponse::Final {
            message: self.planner.report(&outcome),
        }
    }

    /// Persist the thread as no longer suspended.
    fn claim(&self, checkpoint: &mut Checkpoint) -> Result<()> {
        checkpoint.pending = None;
        checkpoint.updated_at = chrono::Utc::now();
        self.checkpointer.save(checkpoint)
    }

    fn commit(&self, checkpoint: &mut Checkpoint, response: &RuntimeResponse) -> Result<()> {
        match response {
            RuntimeResponse::Final { message } => {
                checkpoint.transcript.push(Turn::assistant(message.clone()));
                checkpoint.pending = None;
            }
            RuntimeResponse::Suspended { request } => {
                checkpoint.transcript.push(Turn::assistant(request.to_string()));
                checkpoint.pending = Some(request.clone());
            }
        }
        checkpoint.updated_at = chrono::Utc::now();
        self.checkpointer.save(checkpoint)
    }
}

impl std::fmt::Debug for LocalRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalRuntime")
            .field("tools", &self.tools)
            .field("policy", &self.policy)
            .field("confirm_edits", &self.confirm_edits)
            .finish()
    }
}

#[async_trait]
impl AgentRuntime for LocalRuntime {
    async fn invoke(&self, thread_id: &ThreadId, message: &str) -> Result<RuntimeResponse> {
        let _turn = self.begin_turn(thread_id)?;
        let mut checkpoint = self
            .checkpointer
            .load(thread_id)?
            .unwrap_or_else(|| Checkpoint::new(thread_id.clone()));
        if let Some(pending) = &checkpoint.pending {
            return Err(MailgateError::InvalidState(format!(
                "thread {thread_id} is suspended on `{}`; resume it first",
                pending.name
            )));
        }

        let plan = self.planner.plan(message, &checkpoint.transcript).await?;
        checkpoint.transcript.push(Turn::user(message));

        let response = match plan {
            Plan::Reply { message } => RuntimeResponse::Final { message },
            Plan::Call { request } => {
                if !self.tools.contains(&request.name) {
                    return Err(MailgateError::runtime(format!(
                        "planner proposed unknown tool `{}`",
                        request.name
                    )));
                }
                if self.policy.requires_approval(&request.name) {
                    tracing::info!(
                        thread_id = %thread_id,
                        tool = %request.name,
                        "suspending for approval"
                    );
                    RuntimeResponse::Suspended { request }
                } else {
                    self.finish_call(thread_id, request).await
                }
            }
        };

        self.commit(&mut checkpoint, &response)?;
        Ok(response)
    }

    async fn resume(
        &self,
        thread_id: &ThreadId,
        payload: &ResumePayload,
    ) -> Result<RuntimeResponse> {
        let _turn = self.begin_turn(thread_id)?;
        let mut checkpoint = self.checkpointer.load(thread_id)?.ok_or_else(|| {
            MailgateError::invalid_decision(format!("thread {thread_id} has nothing to resume"))
        })?;
        let pending = checkpoint.pending.clone().ok_or_else(|| {
            MailgateError::invalid_decision(format!("thread {thread_id} is not suspended"))
        })?;
        let decision = payload.sole_decision().ok_or_else(|| {
            MailgateError::invalid_decision(format!(
                "expected exactly one decision, got {}",
                payload.decisions.len()
            ))
        })?;
        if !self.policy.allows(&pending.name, decision.kind()) {
            return Err(MailgateError::invalid_decision(format!(
                "`{}` is not allowed for `{}`",
                decision.kind(),
                pending.name
            )));
        }

        if let Decision::Edit { edited_action } = decision {
            if edited_action.name != pending.name {
                return Err(MailgateError::invalid_decision(format!(
                    "edit names tool `{}` but the thread is suspended on `{}`",
                    edited_action.name, pending.name
                )));
            }
        }

        // The decision is consumed before any tool runs; a failed save below
        // can never leave the call pending for a second approval.
        self.claim(&mut checkpoint)?;
        tracing::info!(
            thread_id = %thread_id,
            tool = %pending.name,
            decision = %decision.kind(),
            "resuming"
        );
        let response = match decision {
            Decision::Approve => self.finish_call(thread_id, pending).await,
            Decision::Reject { message } => RuntimeResponse::Final {
                message: self.planner.report(&ToolOutcome::Declined {
                    call: pending,
                    message: message.clone(),
                }),
            },
            Decision::Edit { edited_action } => {
                let edited = ToolCallRequest {
                    id: pending.id,
                    name: pending.name,
                    args: edited_action.args.clone(),
                };
                if self.confirm_edits {
                    RuntimeResponse::Suspended { request: edited }
                } else {
                    self.finish_call(thread_id, edited).await
                }
            }
        };

        self.commit(&mut checkpoint, &response)?;
        Ok(response)
    }
}

struct TurnGuard<'a> {
    in_flight: &'a Mutex<HashSet<ThreadId>>,
    thread_id: ThreadId,
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut in_flight) = self.in_flight.lock() {
            in_flight.remove(&self.thread_id);
        }
    }
}
