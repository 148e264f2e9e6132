//! Domain model for the task workflow core.
//!
//! The task domain models task creation with per-member execution
//! materialization, the execution status state machine (submit, approve,
//! reject, archive-aware removal), and role-scoped visibility, while
//! keeping all infrastructure concerns outside of the domain boundary.

mod error;
mod execution;
mod ids;
mod role;
mod submission;
mod task;
mod visibility;

pub use error::{
    ParseAssignmentModeError, ParseExecutionStatusError, ParsePriorityError, ParseRoleError,
    ParseTaskLifecycleError, TaskDomainError,
};
pub use execution::{
    Archival, DEFAULT_REJECTION_NOTE, ExecutionStatus, PersistedExecutionData, RefusedTransition,
    ReviewOutcome, TaskExecution,
};
pub use ids::{FolderId, SubmissionId, SubmissionText, TaskId, TaskTitle, TeamId, UserId};
pub use role::Role;
pub use submission::{PersistedSubmissionData, TaskSubmission};
pub use task::{
    Assignee, AssignmentMode, Attachment, PersistedTaskData, Priority, RemovalOutcome, Task,
    TaskDraft, TaskEdits, TaskLifecycle, TaskScope, TeamMember,
};
pub use visibility::{Requester, TaskFilter, is_task_visible};
