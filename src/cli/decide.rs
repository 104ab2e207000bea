//! `mailgate decide`: build a resume payload without running an agent.

use crate::decision::{DecisionInput, DecisionProtocol, ResumePayload, ToolCallRequest};
use crate::error::{MailgateError, Result};
use crate::tools::ToolArgs;

use super::DecideArgs;

/// Build the payload described by `args`.
pub fn build_payload(protocol: &DecisionProtocol, args: &DecideArgs) -> Result<ResumePayload> {
    let pending: ToolCallRequest = serde_json::from_str(&args.pending)
        .map_err(|err| {
            MailgateError::InvalidArgument(format!("--pending is not a tool call: {err}"))
        })?;
    let edit_args = args.args.as_deref().map(parse_args).transpose()?;

    let input = DecisionInput {
        reason: args.reason.clone(),
        edit_args,
    };
    protocol.build_resume(args.kind, Some(&pending), input)
}

/// Pretty JSON for stdout.
pub fn render_payload(protocol: &DecisionProtocol, args: &DecideArgs) -> Result<String> {
    let payload = build_payload(protocol, args)?;
    Ok(serde_json::to_string_pretty(&payload)?)
}

fn parse_args(raw: &str) -> Result<ToolArgs> {
    serde_json::from_str(raw)
        .map_err(|err| {
            MailgateError::InvalidArgument(format!("--args must be a JSON object: {err}"))
        })
}
