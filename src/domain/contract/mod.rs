//! Contract module - Read-only view of contracts and their service tickets.
//!
//! Contracts and tickets are owned by the relational store; the
//! conversation only reads them through the `ContractRepository` port.

mod entities;
mod listing;

pub use entities::{Contract, Ticket};
pub use listing::{format_ticket_list, format_ticket_update, ReportRow, REPORT_DATE_FORMAT};
