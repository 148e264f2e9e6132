//! Zadaniowo: team task-workflow core.
//!
//! This crate provides the task-management core of the Zadaniowo
//! application: task records and their per-user execution tracking,
//! role-scoped visibility resolution, the execution status state machine,
//! and archive folders for finished work.
//!
//! # Architecture
//!
//! Zadaniowo follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, memory)
//!
//! # Modules
//!
//! - [`task`]: Task aggregate, execution state machine, and visibility rules
//! - [`archive`]: Archive folders and sharing for finished executions

pub mod archive;
pub mod task;
