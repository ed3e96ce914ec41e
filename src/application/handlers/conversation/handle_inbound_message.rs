//! HandleInboundMessageHandler - runs one conversation turn per inbound message.
//!
//! This is the turn boundary: whatever happens inside the conversation, the
//! sender gets a reply. Errors and panics become the apology message and the
//! context stays as it was before the turn.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use crate::application::ConversationRegistry;
use crate::domain::conversation::{script, MessageBatch, StateKind, TurnServices};
use crate::domain::foundation::ChannelAddress;
use crate::ports::ChannelSender;

/// An inbound message from the channel.
#[derive(Debug, Clone)]
pub struct InboundMessageCommand {
    /// Sender address; identifies the conversation.
    pub from: ChannelAddress,
    /// Address the message was sent to; replies go out from it.
    pub to: ChannelAddress,
    pub body: String,
}

/// What a turn produced.
#[derive(Debug, Clone)]
pub struct InboundMessageResult {
    /// Replies handed to the sender, in order.
    pub batch: MessageBatch,
    /// Active state after the turn.
    pub state: StateKind,
    /// True when the turn failed and the apology was sent instead.
    pub recovered: bool,
}

/// Handler for inbound messages.
pub struct HandleInboundMessageHandler {
    registry: Arc<ConversationRegistry>,
    services: TurnServices,
    sender: Arc<dyn ChannelSender>,
}

impl HandleInboundMessageHandler {
    pub fn new(
        registry: Arc<ConversationRegistry>,
        services: TurnServices,
        sender: Arc<dyn ChannelSender>,
    ) -> Self {
        Self {
            registry,
            services,
            sender,
        }
    }

    pub async fn handle(&self, cmd: InboundMessageCommand) -> InboundMessageResult {
        let context = self.registry.get_or_create(&cmd.from, &cmd.to).await;
        let mut context = context.lock().await;
        context.set_reply_from(cmd.to.clone());

        let outcome = AssertUnwindSafe(context.request(&self.services, &cmd.body))
            .catch_unwind()
            .await;

        let (batch, recovered) = match outcome {
            Ok(Ok(batch)) => (batch, false),
            Ok(Err(e)) => {
                tracing::error!(
                    conversation = %cmd.from,
                    state = ?context.state_kind(),
                    error = %e,
                    "conversation turn failed"
                );
                (MessageBatch::single(script::APOLOGY), true)
            }
            Err(panic) => {
                tracing::error!(
                    conversation = %cmd.from,
                    state = ?context.state_kind(),
                    panic = %panic_message(panic.as_ref()),
                    "conversation turn panicked"
                );
                (MessageBatch::single(script::APOLOGY), true)
            }
        };

        // Enqueued under the conversation lock so replies of consecutive
        // turns reach the sender in turn order.
        self.sender
            .send_batch(context.reply_from(), &cmd.from, batch.clone());

        InboundMessageResult {
            batch,
            state: context.state_kind(),
            recovered,
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
