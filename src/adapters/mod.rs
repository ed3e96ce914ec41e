//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `postgres` - Contract and ticket queries (sqlx)
//! - `memory` - In-process contract store
//! - `report` - Report rendering and artifact storage
//! - `delivery` - Queued outbound delivery
//! - `twilio` - Messaging provider transport and webhook signatures
//! - `http` - axum endpoints

pub mod delivery;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod report;
pub mod twilio;

pub use delivery::{LoggingTransport, QueuedChannelSender, QueuedChannelSenderConfig};
pub use memory::InMemoryContractRepository;
pub use postgres::PostgresContractRepository;
pub use report::{DocumentReportGenerator, LocalArtifactStorage};
pub use twilio::{TwilioConfig, TwilioSignatureVerifier, TwilioTransport};
