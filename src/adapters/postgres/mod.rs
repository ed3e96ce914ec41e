//! PostgreSQL adapters - Database implementations for repository ports.

mod contract_repository;

pub use contract_repository::PostgresContractRepository;
