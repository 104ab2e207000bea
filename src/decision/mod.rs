//! Human-in-the-loop decision protocol (approve / reject / edit).

pub mod policy;
pub mod protocol;
pub mod types;

pub use policy::{InterruptPolicy, InterruptRule};
pub use protocol::{DecisionProtocol, DEFAULT_REJECT_MESSAGE};
pub use types::*;
