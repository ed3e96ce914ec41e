//! In-process adapters.

mod in_memory_contract_repository;

pub use in_memory_contract_repository::InMemoryContractRepository;
