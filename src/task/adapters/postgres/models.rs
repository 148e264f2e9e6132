//! Diesel row models for task workflow persistence.

use super::schema::{task_assignments, task_executions, task_submissions, tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    #[diesel(sql_type = diesel::sql_types::Uuid)]
    pub id: uuid::Uuid,
    /// Owning team; `None` means a global task.
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Uuid>)]
    pub team_id: Option<uuid::Uuid>,
    /// Assignment mode kind.
    #[diesel(sql_type = diesel::sql_types::Varchar)]
    pub assignment_mode: String,
    /// Whether coordinators qualify for whole-team executions.
    #[diesel(sql_type = diesel::sql_types::Bool)]
    pub include_coordinators: bool,
    /// Task title.
    #[diesel(sql_type = diesel::sql_types::Varchar)]
    pub title: String,
    /// Task description.
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub description: String,
    /// Optional deadline.
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Timestamptz>)]
    pub deadline: Option<DateTime<Utc>>,
    /// Task priority.
    #[diesel(sql_type = diesel::sql_types::Varchar)]
    pub priority: String,
    /// Creating user.
    #[diesel(sql_type = diesel::sql_types::Uuid)]
    pub creator_id: uuid::Uuid,
    /// Creating user's display name.
    #[diesel(sql_type = diesel::sql_types::Varchar)]
    pub creator_name: String,
    /// Task-level lifecycle.
    #[diesel(sql_type = diesel::sql_types::Varchar)]
    pub lifecycle: String,
    /// Whether administrators see the task without involvement.
    #[diesel(sql_type = diesel::sql_types::Bool)]
    pub visible_to_admin: bool,
    /// Attached file references as a JSON array.
    #[diesel(sql_type = diesel::sql_types::Jsonb)]
    pub attachments: Value,
    /// Creation timestamp.
    #[diesel(sql_type = diesel::sql_types::Timestamptz)]
    pub created_at: DateTime<Utc>,
    /// Last change timestamp.
    #[diesel(sql_type = diesel::sql_types::Timestamptz)]
    pub updated_at: DateTime<Utc>,
}

/// Insert model for task records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Owning team; `None` means a global task.
    pub team_id: Option<uuid::Uuid>,
    /// Assignment mode kind.
    pub assignment_mode: String,
    /// Whether coordinators qualify for whole-team executions.
    pub include_coordinators: bool,
    /// Task title.
    pub title: String,
    /// Task description.
    pub description: String,
    /// Optional deadline.
    pub deadline: Option<DateTime<Utc>>,
    /// Task priority.
    pub priority: String,
    /// Creating user.
    pub creator_id: uuid::Uuid,
    /// Creating user's display name.
    pub creator_name: String,
    /// Task-level lifecycle.
    pub lifecycle: String,
    /// Whether administrators see the task without involvement.
    pub visible_to_admin: bool,
    /// Attached file references as a JSON array.
    pub attachments: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last change timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query result row for execution records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = task_executions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ExecutionRow {
    /// Owning task.
    pub task_id: uuid::Uuid,
    /// Executing user.
    pub user_id: uuid::Uuid,
    /// User display-name snapshot.
    pub user_name: String,
    /// Execution status.
    pub status: String,
    /// Most recent rejection note.
    pub rejection_note: Option<String>,
    /// Reviewer-set correction deadline.
    pub correction_deadline: Option<DateTime<Utc>>,
    /// Whether the work was resubmitted after rejection.
    pub corrected: bool,
    /// Last status-change timestamp.
    pub marked_at: DateTime<Utc>,
    /// Archive folder link; `None` means unarchived.
    pub archive_folder_id: Option<uuid::Uuid>,
}

/// Insert model for execution records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = task_executions)]
pub struct NewExecutionRow {
    /// Owning task.
    pub task_id: uuid::Uuid,
    /// Executing user.
    pub user_id: uuid::Uuid,
    /// User display-name snapshot.
    pub user_name: String,
    /// Execution status.
    pub status: String,
    /// Most recent rejection note.
    pub rejection_note: Option<String>,
    /// Reviewer-set correction deadline.
    pub correction_deadline: Option<DateTime<Utc>>,
    /// Whether the work was resubmitted after rejection.
    pub corrected: bool,
    /// Last status-change timestamp.
    pub marked_at: DateTime<Utc>,
    /// Archive folder link; `None` means unarchived.
    pub archive_folder_id: Option<uuid::Uuid>,
}

/// Query result row for submission log entries.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = task_submissions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SubmissionRow {
    /// Submission identifier.
    pub id: uuid::Uuid,
    /// Owning task.
    pub task_id: uuid::Uuid,
    /// Submitting user.
    pub user_id: uuid::Uuid,
    /// User display-name snapshot.
    pub user_name: String,
    /// Submitted work text.
    pub body: String,
    /// Whether the submission was a correction.
    pub corrected: bool,
    /// Submission timestamp.
    pub submitted_at: DateTime<Utc>,
}

/// Insert model for submission log entries.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = task_submissions)]
pub struct NewSubmissionRow {
    /// Submission identifier.
    pub id: uuid::Uuid,
    /// Owning task.
    pub task_id: uuid::Uuid,
    /// Submitting user.
    pub user_id: uuid::Uuid,
    /// User display-name snapshot.
    pub user_name: String,
    /// Submitted work text.
    pub body: String,
    /// Whether the submission was a correction.
    pub corrected: bool,
    /// Submission timestamp.
    pub submitted_at: DateTime<Utc>,
}

/// Query result and insert model for assignment links.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = task_assignments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AssignmentRow {
    /// Owning task.
    pub task_id: uuid::Uuid,
    /// Assigned user.
    pub user_id: uuid::Uuid,
}
