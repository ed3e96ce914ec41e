//! Conversation error types.
//!
//! User mistakes (bad option, unknown contract) are not errors: states
//! answer them with a corrective prompt. These variants are the failures
//! that end a turn early and surface as the apology reply.

use thiserror::Error;

use crate::domain::foundation::DomainError;
use crate::ports::ReportError;

use super::StateKind;

#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("Repository failure: {0}")]
    Repository(#[from] DomainError),

    #[error("Report generation failed: {0}")]
    Report(#[from] ReportError),

    #[error("Illegal transition from {from:?} to {to:?}")]
    IllegalTransition { from: StateKind, to: StateKind },

    #[error("Auto-continuation chain exceeded {limit} steps at {at:?}")]
    ChainTooDeep { at: StateKind, limit: usize },

    #[error("No contract selected for this conversation")]
    NoContractSelected,

    #[error("No ticket selected for this conversation")]
    NoTicketSelected,
}
