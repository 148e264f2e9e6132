//! Error types for task domain validation and parsing.

use super::{ExecutionStatus, TaskId, UserId};
use thiserror::Error;

/// Errors returned while constructing or mutating domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The submitted work text is empty after trimming.
    #[error("submission text must not be empty")]
    EmptySubmissionText,

    /// A specific-people task was created without any assignees.
    #[error("a task assigned to specific people requires at least one assignee")]
    NoAssignees,

    /// No execution exists for the given task/user pair.
    #[error("no execution of task {task_id} exists for user {user_id}")]
    ExecutionNotFound {
        /// Task the operation targeted.
        task_id: TaskId,
        /// User the operation targeted.
        user_id: UserId,
    },

    /// The requested execution status change is not permitted.
    #[error("invalid execution transition for task {task_id}, user {user_id}: {from} -> {to}")]
    InvalidExecutionTransition {
        /// Task the execution belongs to.
        task_id: TaskId,
        /// User the execution belongs to.
        user_id: UserId,
        /// Status the execution currently holds.
        from: ExecutionStatus,
        /// Status the transition requested.
        to: ExecutionStatus,
    },

    /// Only settled (accepted or rejected) executions may be archived.
    #[error("execution of task {task_id} for user {user_id} is {status} and cannot be archived")]
    NotArchivable {
        /// Task the execution belongs to.
        task_id: TaskId,
        /// User the execution belongs to.
        user_id: UserId,
        /// Status the execution currently holds.
        status: ExecutionStatus,
    },
}

/// Error returned while parsing execution statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown execution status: {0}")]
pub struct ParseExecutionStatusError(pub String);

/// Error returned while parsing task lifecycle values from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task lifecycle: {0}")]
pub struct ParseTaskLifecycleError(pub String);

/// Error returned while parsing priorities from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown priority: {0}")]
pub struct ParsePriorityError(pub String);

/// Error returned while parsing role values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);

/// Error returned while parsing assignment modes from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown assignment mode: {0}")]
pub struct ParseAssignmentModeError(pub String);
