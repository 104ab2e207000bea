//! Error classification and recovery.

use serde::{Deserialize, Serialize};

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Decision,
    Schema,
    Runtime,
    State,
    Configuration,
    Serialization,
    ToolExecution,
    Unknown,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoverySuggestion {
    /// Pick a decision that fits the pending call (or wait for one).
    ChooseAnotherDecision,
    /// Supply the missing fields and drop the unknown ones.
    CompleteArguments,
    /// Send the same turn again.
    RetryTurn,
    /// Approve, reject, or edit the pending call first.
    ResolvePendingCall,
    CheckConfiguration,
    CheckToolImplementation,
    ContactSupport,
}
