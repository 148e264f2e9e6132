//! Diesel schema for task workflow persistence.

diesel::table! {
    /// Task records.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Owning team; null means a global task.
        team_id -> Nullable<Uuid>,
        /// Assignment mode kind.
        #[max_length = 50]
        assignment_mode -> Varchar,
        /// Whether coordinators qualify for whole-team executions.
        include_coordinators -> Bool,
        /// Task title.
        #[max_length = 255]
        title -> Varchar,
        /// Task description.
        description -> Text,
        /// Optional deadline.
        deadline -> Nullable<Timestamptz>,
        /// Task priority.
        #[max_length = 50]
        priority -> Varchar,
        /// Creating user.
        creator_id -> Uuid,
        /// Creating user's display name.
        #[max_length = 255]
        creator_name -> Varchar,
        /// Task-level lifecycle.
        #[max_length = 50]
        lifecycle -> Varchar,
        /// Whether administrators see the task without involvement.
        visible_to_admin -> Bool,
        /// Attached file references.
        attachments -> Jsonb,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last change timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-user execution records; the pair is the composite key.
    task_executions (task_id, user_id) {
        /// Owning task.
        task_id -> Uuid,
        /// Executing user.
        user_id -> Uuid,
        /// User display-name snapshot.
        #[max_length = 255]
        user_name -> Varchar,
        /// Execution status.
        #[max_length = 50]
        status -> Varchar,
        /// Most recent rejection note.
        rejection_note -> Nullable<Text>,
        /// Reviewer-set correction deadline.
        correction_deadline -> Nullable<Timestamptz>,
        /// Whether the work was resubmitted after rejection.
        corrected -> Bool,
        /// Last status-change timestamp.
        marked_at -> Timestamptz,
        /// Archive folder link; null means unarchived.
        archive_folder_id -> Nullable<Uuid>,
    }
}

diesel::table! {
    /// Append-only submission log.
    task_submissions (id) {
        /// Submission identifier.
        id -> Uuid,
        /// Owning task.
        task_id -> Uuid,
        /// Submitting user.
        user_id -> Uuid,
        /// User display-name snapshot.
        #[max_length = 255]
        user_name -> Varchar,
        /// Submitted work text.
        body -> Text,
        /// Whether the submission was a correction.
        corrected -> Bool,
        /// Submission timestamp.
        submitted_at -> Timestamptz,
    }
}

diesel::table! {
    /// Explicit assignment links.
    task_assignments (task_id, user_id) {
        /// Owning task.
        task_id -> Uuid,
        /// Assigned user.
        user_id -> Uuid,
    }
}

diesel::joinable!(task_executions -> tasks (task_id));
diesel::joinable!(task_submissions -> tasks (task_id));
diesel::joinable!(task_assignments -> tasks (task_id));
diesel::allow_tables_to_appear_in_same_query!(tasks, task_executions, task_submissions, task_assignments);
