//! Planner seam: decides what the agent does with a user message.
//!
//! A planner only proposes. The runtime owns interrupts, tool execution and
//! checkpoints, so swapping the bundled [`DirectivePlanner`] for a
//! model-backed one changes nothing about the approval flow.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decision::ToolCallRequest;
use crate::error::Result;
use crate::session::Turn;
use crate::tools::{ToolArgs, SEND_EMAIL};

/// The planner's proposal for a user message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Plan {
    /// Answer directly without calling a tool.
    Reply { message: String },
    /// Call a tool.
    Call { request: ToolCallRequest },
}

/// How a proposed tool call ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolOutcome {
    Executed { call: ToolCallRequest, confirmation: String },
    Failed { call: ToolCallRequest, error: String },
    Declined { call: ToolCallRequest, message: String },
}

#[async_trait]
pub trait Planner: Send + Sync {
    /// Propose the next step for `message`. `transcript` holds earlier turns
    /// of the thread, oldest first, without `message`.
    async fn plan(&self, message: &str, transcript: &[Turn]) -> Result<Plan>;

    /// Final assistant message for a finished tool call.
    fn report(&self, outcome: &ToolOutcome) -> String {
        match outcome {
            ToolOutcome::Executed { confirmation, .. } => confirmation.clone(),
            ToolOutcome::Failed { call, error } => {
                format!("I could not run `{}`: {error}", call.name)
            }
            ToolOutcome::Declined { call, message } => {
                format!("I did not run `{}`. {message}", call.name)
            }
        }
    }
}

const USAGE: &str = "I can send emails for you. Tell me who to write to, for example: \
`to: ana@example.com; subject: Lunch; body: Are you free on Friday?`";

const NO_SUBJECT: &str = "(no subject)";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}")
        .expect("email regex must compile")
});

static BODY_FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\bbody\s*:\s*(.+)$")
        .expect("body field regex must compile")
});

static FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(to|recipient|subject)\s*:\s*(.+?)\s*$")
        .expect("field regex must compile")
});

static ABOUT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\babout\s+(.+?)(?:\s+saying\b|[.;\n]|$)")
        .expect("about regex must compile")
});

static SAYING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\bsaying\s+(.+)$")
        .expect("saying regex must compile")
});

/// Turns plain-text requests into `send_email` calls without a model.
///
/// Understands `to: …; subject: …; body: …` directives (separated by `;` or
/// newlines, `body` runs to the end of the message) and the looser
/// "email bob@x.com about lunch saying see you at noon". Messages without an
/// email address get a usage hint.
#[derive(Debug, Clone)]
pub struct DirectivePlanner {
    tool: String,
}

impl Default for DirectivePlanner {
    fn default() -> Self {
        Self {
            tool: SEND_EMAIL.to_string(),
        }
    }
}

impl DirectivePlanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Target a differently named email tool with the same parameters.
    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = tool.into();
        self
    }
}

#[async_trait]
impl Planner for DirectivePlanner {
    async fn plan(&self, message: &str, _transcript: &[Turn]) -> Result<Plan> {
        let Some(args) = parse_draft(message) else {
            return Ok(Plan::Reply {
                message: USAGE.to_string(),
            });
        };
        let request = ToolCallRequest::new(self.tool.clone(), args)
            .with_id(format!("call_{}", Uuid::new_v4().simple()));
        Ok(Plan::Call { request })
    }
}

fn parse_draft(message: &str) -> Option<ToolArgs> {
    let (head, body) = match BODY_FIELD_RE.captures(message) {
        Some(caps) => {
            let start = caps.get(0).map(|m| m.start()).unwrap_or(message.len());
            (&message[..start], caps.get(1).map(|m| m.as_str().trim().to_string()))
        }
        None => (message, None),
    };

    let mut recipient = None;
    let mut subject = None;
    for segment in head.split([';', '\n']) {
        let Some(caps) = FIELD_RE.captures(segment) else {
            continue;
        };
        let value = caps[2].to_string();
        match caps[1].to_ascii_lowercase().as_str() {
            "subject" => subject = Some(value),
            _ => recipient = EMAIL_RE.find(&value).map(|m| m.as_str().to_string()),
        }
    }

    let recipient = recipient.or_else(|| EMAIL_RE.find(message).map(|m| m.as_str().to_string()))?;
    let subject = subject
        .or_else(|| ABOUT_RE.captures(head).map(|caps| caps[1].trim().to_string()))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| NO_SUBJECT.to_string());
    let body = body
        .or_else(|| SAYING_RE.captures(head).map(|caps| caps[1].trim().to_string()))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| message.trim().to_string());

    let mut args = ToolArgs::new();
    args.insert("recipient".into(), recipient.into());
    args.insert("subject".into(), subject.into());
    args.insert("body".into(), body.into());
    Some(args)
}
