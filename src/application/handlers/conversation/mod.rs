//! Conversation command handlers.

mod handle_inbound_message;

pub use handle_inbound_message::{
    HandleInboundMessageHandler, InboundMessageCommand, InboundMessageResult,
};
