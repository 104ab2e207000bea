//! Conversation state, the approval state machine, and the session driver.

pub mod conversation;
pub mod driver;
pub mod state;

pub use conversation::{ConversationState, Role, ThreadId, Turn};
pub use driver::ChatSession;
pub use state::ApprovalState;
