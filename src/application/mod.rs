//! Application layer - Handlers and services.
//!
//! This layer orchestrates domain operations and coordinates between ports.

mod conversation_registry;
pub mod handlers;

pub use conversation_registry::{
    ConversationRegistry, RegistrySweeper, RegistrySweeperConfig, SharedContext,
};
pub use handlers::{HandleInboundMessageHandler, InboundMessageCommand, InboundMessageResult};
