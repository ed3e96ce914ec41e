//! Contract and ticket entities.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ContractId, TicketId, Timestamp};

/// A service contract, identified externally by its unique number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub contract_number: String,
}

impl Contract {
    pub fn new(id: ContractId, contract_number: impl Into<String>) -> Self {
        Self {
            id,
            contract_number: contract_number.into(),
        }
    }
}

/// A service ticket ("chamado") opened against a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub contract_id: ContractId,
    pub description: String,
    /// When the ticket was opened.
    pub opened_at: Timestamp,
    /// When `last_update` was last written.
    pub updated_at: Timestamp,
    /// Free text of the most recent update.
    pub last_update: String,
}
