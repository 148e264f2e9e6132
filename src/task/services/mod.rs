//! Application services for task workflow orchestration.

mod workflow;

pub use workflow::{CreateTaskRequest, TaskWorkflowService, WorkflowError, WorkflowResult};
