//! PostgreSQL implementation of ContractRepository.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::contract::{Contract, Ticket};
use crate::domain::foundation::{ContractId, DomainError, TicketId, Timestamp};
use crate::ports::ContractRepository;

/// PostgreSQL implementation of ContractRepository.
#[derive(Clone)]
pub struct PostgresContractRepository {
    pool: PgPool,
}

impl PostgresContractRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContractRepository for PostgresContractRepository {
    async fn find_contract_by_number(&self, number: &str) -> Result<Option<Contract>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, contract_number
            FROM contracts
            WHERE contract_number = $1
            "#,
        )
        .bind(number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to fetch contract", e))?;

        row.map(row_to_contract).transpose()
    }

    async fn list_tickets(&self, contract_id: ContractId) -> Result<Vec<Ticket>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, contract_id, description, opened_at, updated_at, last_update
            FROM tickets
            WHERE contract_id = $1
            ORDER BY opened_at DESC, id DESC
            "#,
        )
        .bind(contract_id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to list tickets", e))?;

        rows.into_iter().map(row_to_ticket).collect()
    }

    async fn find_ticket(
        &self,
        contract_id: ContractId,
        ticket_id: TicketId,
    ) -> Result<Option<Ticket>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, contract_id, description, opened_at, updated_at, last_update
            FROM tickets
            WHERE contract_id = $1 AND id = $2
            "#,
        )
        .bind(contract_id.value())
        .bind(ticket_id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to fetch ticket", e))?;

        row.map(row_to_ticket).transpose()
    }
}

fn row_to_contract(row: PgRow) -> Result<Contract, DomainError> {
    let id: i64 = row
        .try_get("id")
        .map_err(|e| DomainError::database("Failed to read contract id", e))?;
    let contract_number: String = row
        .try_get("contract_number")
        .map_err(|e| DomainError::database("Failed to read contract number", e))?;

    Ok(Contract::new(ContractId::new(id), contract_number))
}

fn row_to_ticket(row: PgRow) -> Result<Ticket, DomainError> {
    let id: i64 = row
        .try_get("id")
        .map_err(|e| DomainError::database("Failed to read ticket id", e))?;
    let contract_id: i64 = row
        .try_get("contract_id")
        .map_err(|e| DomainError::database("Failed to read ticket contract", e))?;
    let description: String = row
        .try_get("description")
        .map_err(|e| DomainError::database("Failed to read ticket description", e))?;
    let opened_at: chrono::DateTime<chrono::Utc> = row
        .try_get("opened_at")
        .map_err(|e| DomainError::database("Failed to read ticket opened_at", e))?;
    let updated_at: chrono::DateTime<chrono::Utc> = row
        .try_get("updated_at")
        .map_err(|e| DomainError::database("Failed to read ticket updated_at", e))?;
    let last_update: Option<String> = row
        .try_get("last_update")
        .map_err(|e| DomainError::database("Failed to read ticket last_update", e))?;

    Ok(Ticket {
        id: TicketId::new(id),
        contract_id: ContractId::new(contract_id),
        description,
        opened_at: Timestamp::from_datetime(opened_at),
        updated_at: Timestamp::from_datetime(updated_at),
        last_update: last_update.unwrap_or_default(),
    })
}
