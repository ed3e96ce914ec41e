//! Selections accumulated over a conversation.

use serde::Serialize;

use crate::domain::foundation::{ContractId, TicketId};

use super::ConversationError;

/// Contract and ticket chosen so far.
///
/// A ticket can only be selected while a contract is set, and choosing a
/// new contract drops the previous ticket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    contract_id: Option<ContractId>,
    call_number: Option<TicketId>,
}

impl Session {
    pub fn contract_id(&self) -> Option<ContractId> {
        self.contract_id
    }

    pub fn call_number(&self) -> Option<TicketId> {
        self.call_number
    }

    /// Records a verified contract, clearing any ticket selection.
    pub fn set_contract(&mut self, contract_id: ContractId) {
        self.contract_id = Some(contract_id);
        self.call_number = None;
    }

    /// Records the ticket the user asked about.
    pub fn select_ticket(&mut self, call_number: TicketId) -> Result<(), ConversationError> {
        if self.contract_id.is_none() {
            return Err(ConversationError::NoContractSelected);
        }
        self.call_number = Some(call_number);
        Ok(())
    }

    pub fn require_contract(&self) -> Result<ContractId, ConversationError> {
        self.contract_id.ok_or(ConversationError::NoContractSelected)
    }

    pub fn require_ticket(&self) -> Result<(ContractId, TicketId), ConversationError> {
        let contract_id = self.require_contract()?;
        let call_number = self.call_number.ok_or(ConversationError::NoTicketSelected)?;
        Ok((contract_id, call_number))
    }

    /// Forgets every selection.
    pub fn reset(&mut self) {
        self.contract_id = None;
        self.call_number = None;
    }
}
