//! Transport that only logs. Used when no messaging provider is configured.

use async_trait::async_trait;

use crate::ports::{DeliveryError, DeliveryReceipt, MessageTransport, OutboundEnvelope};

#[derive(Debug, Clone, Default)]
pub struct LoggingTransport;

impl LoggingTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MessageTransport for LoggingTransport {
    async fn send(&self, envelope: &OutboundEnvelope) -> Result<DeliveryReceipt, DeliveryError> {
        tracing::info!(
            from = %envelope.from,
            to = %envelope.to,
            media = envelope.message.media_url.as_deref().unwrap_or("-"),
            body = %envelope.message.body,
            "outbound message"
        );
        Ok(DeliveryReceipt { provider_id: None })
    }
}
