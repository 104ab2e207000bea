//! Mailgate: human-in-the-loop approval for an email-sending agent.
//!
//! An agent proposes `send_email` calls; execution pauses until a human
//! approves, rejects, or edits the call. The pieces:
//!
//! - [`decision`]: the decision vocabulary and [`decision::DecisionProtocol`],
//!   which turns a human's choice into a resume payload
//! - [`session`]: per-conversation state and the approval state machine
//! - [`runtime`]: the [`runtime::AgentRuntime`] boundary and an offline
//!   [`runtime::LocalRuntime`] with checkpointing
//! - [`tools`]: tool contracts and the built-in `send_email` tool
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use mailgate::prelude::*;
//!
//! # async fn example() -> mailgate::error::Result<()> {
//! let outbox = Outbox::new();
//! let tools = mailgate::tools::builtin::all_tools(&outbox);
//! let runtime = LocalRuntime::new(tools.clone(), Arc::new(DirectivePlanner::new()));
//! let mut session = ChatSession::new(runtime, DecisionProtocol::new(tools));
//!
//! let response = session.send("to: ana@example.com; subject: Lunch; body: Friday?").await?;
//! assert!(response.is_suspended());
//!
//! session.decide(DecisionKind::Approve, DecisionInput::none()).await?;
//! assert_eq!(outbox.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod decision;
pub mod error;
pub mod prelude;
pub mod runtime;
pub mod session;
pub mod tools;

#[cfg(feature = "cli")]
pub mod cli;
