//! In-memory adapters for task workflow tests and reference behaviour.

mod task;

pub use task::InMemoryTaskRepository;
