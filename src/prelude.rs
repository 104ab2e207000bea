//! Convenience re-exports for common use.

pub use crate::config::GateConfig;
pub use crate::decision::{
    Decision, DecisionInput, DecisionKind, DecisionProtocol, EditedAction, InterruptPolicy,
    ResumePayload, ToolCallRequest,
};
pub use crate::error::{MailgateError, Result};
pub use crate::runtime::{AgentRuntime, DirectivePlanner, LocalRuntime, RuntimeResponse};
pub use crate::session::{ApprovalState, ChatSession, ConversationState, ThreadId};
pub use crate::tools::{AgentTool, Outbox, Tool, ToolArgs, ToolArguments, ToolRegistry};
