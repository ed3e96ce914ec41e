//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, state machines)
//! - `contract` - Contracts, service tickets and their text renderings
//! - `conversation` - The per-address dialogue and its states

pub mod contract;
pub mod conversation;
pub mod foundation;
