//! Approval state machine for one pending tool call at a time.

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::decision::DecisionKind;
use crate::error::{MailgateError, Result};

/// Where a conversation stands with respect to tool approval.
///
/// ```text
/// Idle --suspend--> AwaitingDecision --resolve--> Approved | Rejected | Edited
/// Approved | Rejected | Edited --finish--> Idle
/// Approved | Edited --suspend--> AwaitingDecision
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ApprovalState {
    #[default]
    Idle,
    AwaitingDecision,
    Approved,
    Rejected,
    Edited,
}

impl ApprovalState {
    /// The runtime paused on a tool call.
    pub fn suspend(self) -> Result<Self> {
        match self {
            Self::Idle | Self::Approved | Self::Edited => Ok(Self::AwaitingDecision),
            other => Err(invalid(other, "suspension")),
        }
    }

    /// A decision for the pending call was accepted by the runtime.
    pub fn resolve(self, kind: DecisionKind) -> Result<Self> {
        match self {
            Self::AwaitingDecision => Ok(match kind {
                DecisionKind::Approve => Self::Approved,
                DecisionKind::Reject => Self::Rejected,
                DecisionKind::Edit => Self::Edited,
            }),
            other => Err(invalid(other, &format!("{kind} decision"))),
        }
    }

    /// The runtime returned a final message.
    pub fn finish(self) -> Result<Self> {
        match self {
            Self::AwaitingDecision => Err(invalid(self, "final response")),
            _ => Ok(Self::Idle),
        }
    }

    pub fn is_awaiting_decision(self) -> bool {
        self == Self::AwaitingDecision
    }
}

fn invalid(state: ApprovalState, event: &str) -> MailgateError {
    MailgateError::InvalidState(format!("{event} is not valid while {state}"))
}
