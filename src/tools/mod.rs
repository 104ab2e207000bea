//! Tool system: contracts, schemas, and the built-in email tool.

pub mod arguments;
pub mod builtin;
pub mod registry;
pub mod tool;
pub mod types;
pub mod validation;

pub use arguments::ToolArguments;
pub use builtin::{Outbox, SentEmail, SEND_EMAIL};
pub use registry::ToolRegistry;
pub use tool::{AgentTool, Tool, ToolExecutionContext};
pub use types::{ToolArgs, ToolParameters};
pub use validation::{check_arguments, validate_arguments, ArgumentReport};
