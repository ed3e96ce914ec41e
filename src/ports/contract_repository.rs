//! ContractRepository port - read-only queries over contracts and tickets.

use async_trait::async_trait;

use crate::domain::{
    contract::{Contract, Ticket},
    foundation::{ContractId, DomainError, TicketId},
};

/// Query surface the conversation needs from the contract store.
///
/// All methods are reads. Absence is `Ok(None)` or an empty list; `Err`
/// is reserved for store failures.
#[async_trait]
pub trait ContractRepository: Send + Sync {
    /// Finds a contract by its number. Matching is exact and case-sensitive.
    async fn find_contract_by_number(&self, number: &str) -> Result<Option<Contract>, DomainError>;

    /// Lists a contract's tickets, newest opened first.
    async fn list_tickets(&self, contract_id: ContractId) -> Result<Vec<Ticket>, DomainError>;

    /// Finds one ticket belonging to the given contract.
    async fn find_ticket(
        &self,
        contract_id: ContractId,
        ticket_id: TicketId,
    ) -> Result<Option<Ticket>, DomainError>;
}
