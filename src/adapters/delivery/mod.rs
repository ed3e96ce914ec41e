//! Outbound delivery adapters.

mod logging_transport;
mod queued_channel_sender;

pub use logging_transport::LoggingTransport;
pub use queued_channel_sender::{QueuedChannelSender, QueuedChannelSenderConfig};
