//! Contract Desk - SMS front-end for contract and service ticket lookup.
//!
//! Each phone number gets its own conversation: the caller identifies a
//! contract, lists its open tickets, checks the latest update on one, and can
//! ask for a report that is delivered as a download link.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
