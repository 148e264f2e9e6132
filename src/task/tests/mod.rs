//! Unit tests for the task workflow module.

mod domain_tests;
mod transition_tests;
