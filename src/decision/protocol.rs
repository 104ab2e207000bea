//! Turning a human's choice into a resume payload.
//!
//! [`DecisionProtocol::build_resume`] is a pure construction step: it checks
//! the choice against the pending call and returns the payload, or an error
//! and no payload. Sending the payload and clearing the pending slot is the
//! caller's job, and the caller must not resume after an error.

use crate::error::{MailgateError, Result};
use crate::tools::{check_arguments, ToolArgs, ToolRegistry};

use super::policy::InterruptPolicy;
use super::types::{
    Decision, DecisionInput, DecisionKind, EditedAction, ResumePayload, ToolCallRequest,
};

/// Reason sent with a rejection when the human gives none.
pub const DEFAULT_REJECT_MESSAGE: &str =
    "Do not send an email. The email needs more context or additions from the user.";

/// Builds and validates resume payloads for pending tool calls.
#[derive(Debug, Clone)]
pub struct DecisionProtocol {
    tools: ToolRegistry,
    policy: InterruptPolicy,
    reject_message: String,
}

impl DecisionProtocol {
    /// Protocol over `tools`, with no per-tool restrictions.
    pub fn new(tools: ToolRegistry) -> Self {
        Self {
            tools,
            policy: InterruptPolicy::default(),
            reject_message: DEFAULT_REJECT_MESSAGE.to_string(),
        }
    }

    pub fn with_policy(mut self, policy: InterruptPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Override the default rejection reason. Blank values keep the default.
    pub fn with_reject_message(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        if !message.trim().is_empty() {
            self.reject_message = message;
        }
        self
    }

    pub fn reject_message(&self) -> &str {
        &self.reject_message
    }

    pub fn policy(&self) -> &InterruptPolicy {
        &self.policy
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Build the payload resolving `pending` with `kind`.
    ///
    /// Edits replace the pending arguments wholesale; `input.edit_args` must
    /// be a complete argument map for the pending tool.
    pub fn build_resume(
        &self,
        kind: DecisionKind,
        pending: Option<&ToolCallRequest>,
        input: DecisionInput,
    ) -> Result<ResumePayload> {
        let pending = require_pending(pending)?;
        self.check_allowed(pending, kind)?;

        let decision = match kind {
            DecisionKind::Approve => Decision::Approve,
            DecisionKind::Reject => Decision::Reject {
                message: input
                    .reason
                    .unwrap_or_else(|| self.reject_message.clone()),
            },
            DecisionKind::Edit => {
                let args = input.edit_args.ok_or_else(|| {
                    MailgateError::invalid_decision(format!(
                        "edit of `{}` requires replacement arguments",
                        pending.name
                    ))
                })?;
                self.check_edit_args(&pending.name, &args)?;
                Decision::Edit {
                    edited_action: EditedAction {
                        name: pending.name.clone(),
                        args,
                    },
                }
            }
        };

        tracing::debug!(tool = %pending.name, decision = %kind, "built resume payload");
        Ok(ResumePayload::single(decision))
    }

    /// Check an externally supplied payload against the pending call.
    pub fn validate(
        &self,
        payload: &ResumePayload,
        pending: Option<&ToolCallRequest>,
    ) -> Result<()> {
        let pending = require_pending(pending)?;
        let decision = payload.sole_decision().ok_or_else(|| {
            MailgateError::invalid_decision(format!(
                "expected exactly one decision for the pending call, got {}",
                payload.decisions.len()
            ))
        })?;
        self.check_allowed(pending, decision.kind())?;

        if let Decision::Edit { edited_action } = decision {
            if edited_action.name != pending.name {
                return Err(MailgateError::invalid_decision(format!(
                    "edit names tool `{}` but the pending call is to `{}`",
                    edited_action.name, pending.name
                )));
            }
            self.check_edit_args(&pending.name, &edited_action.args)?;
        }
        Ok(())
    }

    fn check_allowed(&self, pending: &ToolCallRequest, kind: DecisionKind) -> Result<()> {
        if self.policy.allows(&pending.name, kind) {
            return Ok(());
        }
        let allowed: Vec<String> = self
            .policy
            .allowed(&pending.name)
            .iter()
            .map(ToString::to_string)
            .collect();
        Err(MailgateError::invalid_decision(format!(
            "`{kind}` is not allowed for `{}` (allowed: {})",
            pending.name,
            allowed.join(", ")
        )))
    }

    fn check_edit_args(&self, tool: &str, args: &ToolArgs) -> Result<()> {
        let params = self.tools.parameters(tool).ok_or_else(|| {
            MailgateError::invalid_decision(format!("cannot edit unknown tool `{tool}`"))
        })?;
        let report = check_arguments(args, &params.schema);
        if report.is_clean() {
            return Ok(());
        }
        Err(MailgateError::SchemaMismatch {
            tool: tool.to_string(),
            missing: report.missing,
            unknown: report.unknown,
            mistyped: report.mistyped,
        })
    }
}

fn require_pending(pending: Option<&ToolCallRequest>) -> Result<&ToolCallRequest> {
    pending.ok_or_else(|| MailgateError::invalid_decision("no tool call is awaiting a decision"))
}
