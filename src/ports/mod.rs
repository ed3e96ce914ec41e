//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `ContractRepository` - Contract and ticket lookups
//! - `ReportGenerator` - Ticket reports as downloadable artifacts
//! - `ArtifactStorage` - Storage behind the report download endpoint
//! - `ChannelSender` / `MessageTransport` - Outbound messaging

mod artifact_storage;
mod channel_sender;
mod contract_repository;
mod report_generator;

pub use artifact_storage::{validate_artifact_name, ArtifactStorage, StorageError};
pub use channel_sender::{
    ChannelSender, DeliveryError, DeliveryReceipt, MessageTransport, OutboundEnvelope,
};
pub use contract_repository::ContractRepository;
pub use report_generator::{
    ReportArtifact, ReportError, ReportFormat, ReportGenerator, ReportRequest,
};
