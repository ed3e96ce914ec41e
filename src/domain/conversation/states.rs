//! The conversation states.
//!
//! Every state answers user input through [`ConversationState::handle`].
//! States that also act on entry implement [`Continuable`] and expose it via
//! [`ConversationState::as_continuable`]; the transition routine runs that
//! step as soon as the state becomes active.

use async_trait::async_trait;
use std::fmt;

use crate::domain::contract::{format_ticket_list, format_ticket_update};
use crate::domain::foundation::TicketId;
use crate::ports::{ReportError, ReportRequest};

use super::script;
use super::{ConversationError, MessageBatch, OutboundMessage, StateKind, Turn};

/// A state of the conversation.
#[async_trait]
pub trait ConversationState: Send + Sync + fmt::Debug {
    fn kind(&self) -> StateKind;

    /// Answers one inbound message, possibly transitioning.
    async fn handle(
        &self,
        turn: &mut Turn<'_>,
        message: &str,
    ) -> Result<MessageBatch, ConversationError>;

    /// The state's entry step, when it has one.
    fn as_continuable(&self) -> Option<&dyn Continuable> {
        None
    }
}

/// Optional capability: a zero-input step run on entering the state.
#[async_trait]
pub trait Continuable: Send + Sync {
    async fn auto_respond(&self, turn: &mut Turn<'_>) -> Result<MessageBatch, ConversationError>;
}

// ════════════════════════════════════════════════════════════════════════════
// Start
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default)]
pub struct StartState;

#[async_trait]
impl ConversationState for StartState {
    fn kind(&self) -> StateKind {
        StateKind::Start
    }

    async fn handle(
        &self,
        turn: &mut Turn<'_>,
        message: &str,
    ) -> Result<MessageBatch, ConversationError> {
        if script::is_greeting(message) {
            return Ok(MessageBatch::single(script::WELCOME));
        }

        let contract_number = message.trim();
        if contract_number.is_empty() {
            return Ok(MessageBatch::single(script::CONTRACT_NOT_FOUND));
        }

        match turn.contracts().find_contract_by_number(contract_number).await? {
            Some(contract) => {
                tracing::info!(contract_id = %contract.id, "contract verified");
                turn.session_mut().set_contract(contract.id);
                let menu = turn.transition_to(StateKind::SelectOption).await?;
                Ok(MessageBatch::single(script::CONTRACT_VERIFIED).followed_by(menu))
            }
            None => Ok(MessageBatch::single(script::CONTRACT_NOT_FOUND)),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SelectOption
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default)]
pub struct SelectOptionState;

#[async_trait]
impl ConversationState for SelectOptionState {
    fn kind(&self) -> StateKind {
        StateKind::SelectOption
    }

    async fn handle(
        &self,
        turn: &mut Turn<'_>,
        message: &str,
    ) -> Result<MessageBatch, ConversationError> {
        if script::is_choice(message, "1") {
            turn.transition_to(StateKind::GetCalls).await
        } else if script::is_choice(message, "2") {
            turn.transition_to(StateKind::GenerateReport).await
        } else {
            Ok(MessageBatch::single(script::INVALID_OPTION))
        }
    }

    fn as_continuable(&self) -> Option<&dyn Continuable> {
        Some(self)
    }
}

#[async_trait]
impl Continuable for SelectOptionState {
    async fn auto_respond(&self, _turn: &mut Turn<'_>) -> Result<MessageBatch, ConversationError> {
        Ok(MessageBatch::single(script::MAIN_MENU))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GetCalls
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default)]
pub struct GetCallsState;

#[async_trait]
impl ConversationState for GetCallsState {
    fn kind(&self) -> StateKind {
        StateKind::GetCalls
    }

    async fn handle(
        &self,
        turn: &mut Turn<'_>,
        _message: &str,
    ) -> Result<MessageBatch, ConversationError> {
        self.auto_respond(turn).await
    }

    fn as_continuable(&self) -> Option<&dyn Continuable> {
        Some(self)
    }
}

#[async_trait]
impl Continuable for GetCallsState {
    async fn auto_respond(&self, turn: &mut Turn<'_>) -> Result<MessageBatch, ConversationError> {
        let contract_id = turn.session().require_contract()?;
        let mut batch = MessageBatch::single(script::FETCHING_TICKETS);

        let tickets = turn.contracts().list_tickets(contract_id).await?;
        match format_ticket_list(&tickets) {
            Some(listing) => batch.push_text(listing),
            None => batch.push_text(script::NO_TICKETS),
        }
        batch.push_text(script::ASK_TICKET_NUMBER);

        let next = turn.transition_to(StateKind::SelectCall).await?;
        Ok(batch.followed_by(next))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SelectCall
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default)]
pub struct SelectCallState;

#[async_trait]
impl ConversationState for SelectCallState {
    fn kind(&self) -> StateKind {
        StateKind::SelectCall
    }

    async fn handle(
        &self,
        turn: &mut Turn<'_>,
        message: &str,
    ) -> Result<MessageBatch, ConversationError> {
        let Ok(call_number) = message.parse::<TicketId>() else {
            return Ok(MessageBatch::single(script::INVALID_TICKET_NUMBER));
        };

        turn.session_mut().select_ticket(call_number)?;
        let updates = turn.transition_to(StateKind::GetCallUpdates).await?;
        Ok(MessageBatch::single(script::TICKET_ACCEPTED).followed_by(updates))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GetCallUpdates
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default)]
pub struct GetCallUpdatesState;

#[async_trait]
impl ConversationState for GetCallUpdatesState {
    fn kind(&self) -> StateKind {
        StateKind::GetCallUpdates
    }

    async fn handle(
        &self,
        turn: &mut Turn<'_>,
        _message: &str,
    ) -> Result<MessageBatch, ConversationError> {
        self.auto_respond(turn).await
    }

    fn as_continuable(&self) -> Option<&dyn Continuable> {
        Some(self)
    }
}

#[async_trait]
impl Continuable for GetCallUpdatesState {
    async fn auto_respond(&self, turn: &mut Turn<'_>) -> Result<MessageBatch, ConversationError> {
        let (contract_id, call_number) = turn.session().require_ticket()?;

        let reply = match turn.contracts().find_ticket(contract_id, call_number).await? {
            Some(ticket) => script::ticket_updates(call_number, &format_ticket_update(&ticket)),
            None => script::ticket_not_found(call_number),
        };

        let next = turn.transition_to(StateKind::SelectReturn).await?;
        Ok(MessageBatch::single(reply).followed_by(next))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SelectReturn
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default)]
pub struct SelectReturnState;

#[async_trait]
impl ConversationState for SelectReturnState {
    fn kind(&self) -> StateKind {
        StateKind::SelectReturn
    }

    async fn handle(
        &self,
        turn: &mut Turn<'_>,
        message: &str,
    ) -> Result<MessageBatch, ConversationError> {
        if script::is_choice(message, "1") {
            let menu = turn.transition_to(StateKind::SelectOption).await?;
            Ok(MessageBatch::single(script::RETURNING_TO_MENU).followed_by(menu))
        } else if script::is_choice(message, "2") {
            let farewell = turn.transition_to(StateKind::End).await?;
            Ok(MessageBatch::single(script::CLOSING_SESSION).followed_by(farewell))
        } else {
            Ok(MessageBatch::single(script::INVALID_RETURN_OPTION))
        }
    }

    fn as_continuable(&self) -> Option<&dyn Continuable> {
        Some(self)
    }
}

#[async_trait]
impl Continuable for SelectReturnState {
    async fn auto_respond(&self, _turn: &mut Turn<'_>) -> Result<MessageBatch, ConversationError> {
        Ok(MessageBatch::single(script::RETURN_OPTIONS))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GenerateReport
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateReportState;

#[async_trait]
impl ConversationState for GenerateReportState {
    fn kind(&self) -> StateKind {
        StateKind::GenerateReport
    }

    async fn handle(
        &self,
        turn: &mut Turn<'_>,
        _message: &str,
    ) -> Result<MessageBatch, ConversationError> {
        self.auto_respond(turn).await
    }

    fn as_continuable(&self) -> Option<&dyn Continuable> {
        Some(self)
    }
}

#[async_trait]
impl Continuable for GenerateReportState {
    async fn auto_respond(&self, turn: &mut Turn<'_>) -> Result<MessageBatch, ConversationError> {
        let contract_id = turn.session().require_contract()?;
        let tickets = turn.contracts().list_tickets(contract_id).await?;
        let request = ReportRequest {
            contract_id,
            tickets,
        };

        match turn.reports().generate(&request).await {
            Ok(artifact) => {
                tracing::info!(
                    contract_id = %contract_id,
                    file = %artifact.file_name,
                    "report generated"
                );
                let mut batch = MessageBatch::new();
                batch.push(OutboundMessage::with_media(
                    script::report_ready(&artifact.download_url),
                    artifact.download_url.clone(),
                ));
                let next = turn.transition_to(StateKind::End).await?;
                Ok(batch.followed_by(next))
            }
            Err(ReportError::NoData) => {
                let menu = turn.transition_to(StateKind::SelectOption).await?;
                Ok(MessageBatch::single(script::NO_REPORT_DATA).followed_by(menu))
            }
            Err(e) => Err(e.into()),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// End
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default)]
pub struct EndState;

#[async_trait]
impl ConversationState for EndState {
    fn kind(&self) -> StateKind {
        StateKind::End
    }

    async fn handle(
        &self,
        _turn: &mut Turn<'_>,
        _message: &str,
    ) -> Result<MessageBatch, ConversationError> {
        Ok(MessageBatch::single(script::SESSION_FINISHED))
    }

    fn as_continuable(&self) -> Option<&dyn Continuable> {
        Some(self)
    }
}

#[async_trait]
impl Continuable for EndState {
    async fn auto_respond(&self, turn: &mut Turn<'_>) -> Result<MessageBatch, ConversationError> {
        turn.session_mut().reset();
        turn.transition_to(StateKind::Start).await
    }
}
