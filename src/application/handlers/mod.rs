//! Command handlers.

pub mod conversation;

pub use conversation::{HandleInboundMessageHandler, InboundMessageCommand, InboundMessageResult};
