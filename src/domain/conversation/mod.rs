//! Conversation domain module.
//!
//! A conversation is a finite-state dialogue keyed by the sender's address.
//! Each inbound message is handled by the active state, which may walk
//! several states in one turn through auto-continuations.

mod context;
mod errors;
mod message;
pub mod script;
mod session;
mod state;
mod states;
mod turn;

pub use context::{ContinuationMode, ConversationContext};
pub use errors::ConversationError;
pub use message::{MessageBatch, OutboundMessage};
pub use session::Session;
pub use state::StateKind;
pub use states::{
    Continuable, ConversationState, EndState, GenerateReportState, GetCallUpdatesState,
    GetCallsState, SelectCallState, SelectOptionState, SelectReturnState, StartState,
};
pub use turn::{Turn, TurnServices};
