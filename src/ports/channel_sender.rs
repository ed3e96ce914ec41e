//! Outbound messaging ports.
//!
//! `ChannelSender` is what the webhook calls: it accepts a batch and returns
//! at once. `MessageTransport` is the provider seam a sender delivers
//! through, one message at a time.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::conversation::{MessageBatch, OutboundMessage};
use crate::domain::foundation::ChannelAddress;

/// Fire-and-forget delivery of a conversation's replies.
///
/// # Contract
///
/// Implementations must:
/// - Return without waiting for delivery
/// - Deliver the messages of one destination in the order they were enqueued
/// - Skip blank messages
/// - Log and drop failures; callers never see them
pub trait ChannelSender: Send + Sync {
    fn send_batch(&self, from: &ChannelAddress, to: &ChannelAddress, batch: MessageBatch);
}

/// One message addressed for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEnvelope {
    pub from: ChannelAddress,
    pub to: ChannelAddress,
    pub message: OutboundMessage,
}

/// Provider acknowledgement for a delivered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// Provider-assigned message id, when the provider returns one.
    pub provider_id: Option<String>,
}

/// Port for the messaging provider.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    async fn send(&self, envelope: &OutboundEnvelope) -> Result<DeliveryReceipt, DeliveryError>;
}

/// Errors that can occur while delivering one message.
#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    /// Provider could not be reached.
    #[error("Provider unreachable: {0}")]
    Network(String),

    /// Provider answered with a failure status.
    #[error("Provider rejected message ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Provider response invalid: {0}")]
    InvalidResponse(String),
}
