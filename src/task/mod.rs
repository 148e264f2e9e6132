//! Task workflow management for Zadaniowo.
//!
//! This module implements the task core: creating tasks scoped to a team or
//! globally, materialising per-user executions, enforcing validated
//! execution status transitions (submit, approve, reject, archive-aware
//! removal), and resolving which tasks a requester may see based on their
//! role. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
