//! Decision vocabulary and resume payloads.

use std::fmt;

use bon::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::tools::ToolArgs;

/// A tool call the runtime wants to execute but must pause for approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Opaque call identifier assigned by the runtime (may be empty).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Tool name.
    pub name: String,
    /// Proposed arguments.
    #[serde(default)]
    pub args: ToolArgs,
}

impl ToolCallRequest {
    pub fn new(name: impl Into<String>, args: ToolArgs) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            args,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// String value of an argument, for rendering defaults in a form.
    pub fn arg_str(&self, name: &str) -> Option<&str> {
        self.args.get(name).and_then(|v| v.as_str())
    }
}

impl fmt::Display for ToolCallRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pending call to `{}`", self.name)?;
        for (key, value) in &self.args {
            match value.as_str() {
                Some(text) => write!(f, "\n{key}: {text}")?,
                None => write!(f, "\n{key}: {value}")?,
            }
        }
        Ok(())
    }
}

/// The three literals a human can answer a pending call with.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DecisionKind {
    Approve,
    Reject,
    Edit,
}

/// Replacement tool call carried by an edit decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditedAction {
    pub name: String,
    pub args: ToolArgs,
}

/// A resolved human decision for one pending tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Reject { message: String },
    Edit { edited_action: EditedAction },
}

impl Decision {
    pub fn kind(&self) -> DecisionKind {
        match self {
            Decision::Approve => DecisionKind::Approve,
            Decision::Reject { .. } => DecisionKind::Reject,
            Decision::Edit { .. } => DecisionKind::Edit,
        }
    }
}

/// What the runtime receives to continue a suspended execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumePayload {
    pub decisions: Vec<Decision>,
}

impl ResumePayload {
    /// Payload resolving a single pending call.
    pub fn single(decision: Decision) -> Self {
        Self {
            decisions: vec![decision],
        }
    }

    /// The decision, when the payload carries exactly one.
    pub fn sole_decision(&self) -> Option<&Decision> {
        match self.decisions.as_slice() {
            [decision] => Some(decision),
            _ => None,
        }
    }
}

/// Extra input accompanying a decision literal.
///
/// `reason` is only read for rejections, `edit_args` only for edits.
///
/// ```
/// use mailgate::decision::DecisionInput;
///
/// let input = DecisionInput::builder().reason("needs a budget figure").build();
/// assert_eq!(input.reason.as_deref(), Some("needs a budget figure"));
/// assert!(input.edit_args.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Builder)]
pub struct DecisionInput {
    #[builder(into)]
    pub reason: Option<String>,
    pub edit_args: Option<ToolArgs>,
}

impl DecisionInput {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn reason(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            edit_args: None,
        }
    }

    pub fn edit(args: ToolArgs) -> Self {
        Self {
            reason: None,
            edit_args: Some(args),
        }
    }
}
