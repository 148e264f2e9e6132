//! Archive folders for finished task executions.
//!
//! Users collect accepted or rejected executions into named folders and
//! share them by invitation; an invitee sees folder contents only after
//! accepting. The folder module is a collaborator of the task workflow
//! core: it consults and mutates execution archive links exclusively
//! through the [`ports::ExecutionArchiver`] contract.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
