//! In-memory contract repository.
//!
//! Holds contracts and tickets in process memory. Used by tests and for
//! running the conversation without a database.

use async_trait::async_trait;
use std::sync::{PoisonError, RwLock};

use crate::domain::contract::{Contract, Ticket};
use crate::domain::foundation::{ContractId, DomainError, TicketId};
use crate::ports::ContractRepository;

#[derive(Default)]
struct Store {
    contracts: Vec<Contract>,
    tickets: Vec<Ticket>,
}

/// In-memory implementation of the ContractRepository port.
#[derive(Default)]
pub struct InMemoryContractRepository {
    store: RwLock<Store>,
}

impl InMemoryContractRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a contract, replacing any contract with the same id.
    pub fn insert_contract(&self, contract: Contract) {
        let mut store = self.store.write().unwrap_or_else(PoisonError::into_inner);
        store.contracts.retain(|c| c.id != contract.id);
        store.contracts.push(contract);
    }

    /// Adds a ticket, replacing any ticket with the same id.
    pub fn insert_ticket(&self, ticket: Ticket) {
        let mut store = self.store.write().unwrap_or_else(PoisonError::into_inner);
        store.tickets.retain(|t| t.id != ticket.id);
        store.tickets.push(ticket);
    }

    /// Builder form of [`insert_contract`](Self::insert_contract).
    pub fn with_contract(self, contract: Contract) -> Self {
        self.insert_contract(contract);
        self
    }

    /// Builder form of [`insert_ticket`](Self::insert_ticket).
    pub fn with_ticket(self, ticket: Ticket) -> Self {
        self.insert_ticket(ticket);
        self
    }
}

#[async_trait]
impl ContractRepository for InMemoryContractRepository {
    async fn find_contract_by_number(&self, number: &str) -> Result<Option<Contract>, DomainError> {
        let store = self.store.read().unwrap_or_else(PoisonError::into_inner);
        Ok(store
            .contracts
            .iter()
            .find(|c| c.contract_number == number)
            .cloned())
    }

    async fn list_tickets(&self, contract_id: ContractId) -> Result<Vec<Ticket>, DomainError> {
        let store = self.store.read().unwrap_or_else(PoisonError::into_inner);
        let mut tickets: Vec<Ticket> = store
            .tickets
            .iter()
            .filter(|t| t.contract_id == contract_id)
            .cloned()
            .collect();
        tickets.sort_by(|a, b| b.opened_at.cmp(&a.opened_at).then(b.id.cmp(&a.id)));
        Ok(tickets)
    }

    async fn find_ticket(
        &self,
        contract_id: ContractId,
        ticket_id: TicketId,
    ) -> Result<Option<Ticket>, DomainError> {
        let store = self.store.read().unwrap_or_else(PoisonError::into_inner);
        Ok(store
            .tickets
            .iter()
            .find(|t| t.contract_id == contract_id && t.id == ticket_id)
            .cloned())
    }
}
