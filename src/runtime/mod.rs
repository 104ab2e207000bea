//! Agent runtime boundary and a local, offline implementation.
//!
//! The [`AgentRuntime`] trait is all the session layer needs: start a turn
//! with a user message, or continue a suspended turn with a
//! [`ResumePayload`]. Either call ends in a final assistant message or a new
//! suspension.

pub mod checkpoint;
pub mod local;
pub mod planner;

pub use checkpoint::{Checkpoint, Checkpointer, FileCheckpointer, InMemoryCheckpointer};
pub use local::LocalRuntime;
pub use planner::{DirectivePlanner, Plan, Planner, ToolOutcome};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::decision::{ResumePayload, ToolCallRequest};
use crate::error::Result;
use crate::session::ThreadId;

/// What the runtime answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeResponse {
    /// The turn is over.
    Final { message: String },
    /// Execution paused until a human decides on `request`.
    Suspended { request: ToolCallRequest },
}

impl RuntimeResponse {
    pub fn is_suspended(&self) -> bool {
        matches!(self, Self::Suspended { .. })
    }
}

/// An interruptible agent keyed by thread id.
///
/// Errors from the runtime (network, model, storage) are returned as is;
/// callers propagate them unmodified.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Start a turn with a user message.
    async fn invoke(&self, thread_id: &ThreadId, message: &str) -> Result<RuntimeResponse>;

    /// Continue a suspended turn.
    async fn resume(
        &self,
        thread_id: &ThreadId,
        payload: &ResumePayload,
    ) -> Result<RuntimeResponse>;
}
