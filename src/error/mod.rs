//! Error types for mailgate.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion};

use thiserror::Error;

/// Primary error type for all mailgate operations.
#[derive(Error, Debug)]
pub enum MailgateError {
    #[error("Invalid decision: {0}")]
    InvalidDecision(String),

    #[error(
        "Schema mismatch for tool '{tool}': {}",
        describe_fields(.missing, .unknown, .mistyped)
    )]
    SchemaMismatch {
        tool: String,
        missing: Vec<String>,
        unknown: Vec<String>,
        mistyped: Vec<String>,
    },

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Tool execution error: {tool_name}: {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl MailgateError {
    /// Create an invalid-decision error.
    pub fn invalid_decision(message: impl Into<String>) -> Self {
        Self::InvalidDecision(message.into())
    }

    /// Create a runtime error.
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime(message.into())
    }

    /// Fields the caller must supply to make an edit acceptable.
    pub fn missing_fields(&self) -> &[String] {
        match self {
            Self::SchemaMismatch { missing, .. } => missing,
            _ => &[],
        }
    }

    /// Fields the caller supplied that the tool does not declare.
    pub fn unknown_fields(&self) -> &[String] {
        match self {
            Self::SchemaMismatch { unknown, .. } => unknown,
            _ => &[],
        }
    }

    /// Fields whose value has the wrong JSON type.
    pub fn mistyped_fields(&self) -> &[String] {
        match self {
            Self::SchemaMismatch { mistyped, .. } => mistyped,
            _ => &[],
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidDecision(_) => ErrorCategory::Decision,
            Self::SchemaMismatch { .. } => ErrorCategory::Schema,
            Self::Runtime(_) => ErrorCategory::Runtime,
            Self::InvalidState(_) => ErrorCategory::State,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::ToolExecution { .. } => ErrorCategory::ToolExecution,
            _ => ErrorCategory::Unknown,
        }
    }

    /// Whether the same turn may succeed if sent again unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self.category(), ErrorCategory::Runtime)
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self.category() {
            ErrorCategory::Decision => RecoverySuggestion::ChooseAnotherDecision,
            ErrorCategory::Schema => RecoverySuggestion::CompleteArguments,
            ErrorCategory::Runtime => RecoverySuggestion::RetryTurn,
            ErrorCategory::State => RecoverySuggestion::ResolvePendingCall,
            ErrorCategory::Configuration => RecoverySuggestion::CheckConfiguration,
            ErrorCategory::ToolExecution => RecoverySuggestion::CheckToolImplementation,
            _ => RecoverySuggestion::ContactSupport,
        }
    }
}

fn describe_fields(missing: &[String], unknown: &[String], mistyped: &[String]) -> String {
    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("missing [{}]", missing.join(", ")));
    }
    if !unknown.is_empty() {
        parts.push(format!("unknown [{}]", unknown.join(", ")));
    }
    if !mistyped.is_empty() {
        parts.push(format!("wrong type [{}]", mistyped.join(", ")));
    }
    if parts.is_empty() {
        "arguments rejected".to_string()
    } else {
        parts.join("; ")
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, MailgateError>;
