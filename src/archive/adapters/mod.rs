//! Persistence adapters for archive folders.

pub mod memory;
pub mod postgres;
