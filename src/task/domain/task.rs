//! Task aggregate root and related task lifecycle types.

use super::{
    Archival, ExecutionStatus, FolderId, ParseAssignmentModeError, ParsePriorityError,
    ParseTaskLifecycleError, Role, SubmissionText, TaskDomainError, TaskId, TaskSubmission,
    TaskTitle, TeamId, UserId,
    execution::{RefusedTransition, ReviewOutcome, TaskExecution},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Team placement of a task.
///
/// Replaces the source's nullable team id with an exhaustive variant:
/// a task either belongs to one team or is global.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskScope {
    /// Visible across teams, subject to role rules.
    Global,
    /// Scoped to one team.
    Team {
        /// The owning team.
        team_id: TeamId,
    },
}

impl TaskScope {
    /// Returns the owning team, if any.
    #[must_use]
    pub const fn team_id(self) -> Option<TeamId> {
        match self {
            Self::Global => None,
            Self::Team { team_id } => Some(team_id),
        }
    }

    /// Returns whether the task appears when the given team is requested:
    /// the task is global or belongs to that team.
    #[must_use]
    pub fn matches_team(self, team_id: TeamId) -> bool {
        match self {
            Self::Global => true,
            Self::Team { team_id: own } => own == team_id,
        }
    }
}

/// How task responsibility is distributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssignmentMode {
    /// Every qualifying team member receives an execution at creation.
    WholeTeam {
        /// Whether coordinators qualify alongside participants.
        include_coordinators: bool,
    },
    /// Only explicitly listed assignees receive executions.
    SpecificPeople,
}

impl AssignmentMode {
    /// Returns the canonical storage representation of the mode kind.
    #[must_use]
    pub const fn kind_str(self) -> &'static str {
        match self {
            Self::WholeTeam { .. } => "whole_team",
            Self::SpecificPeople => "specific_people",
        }
    }

    /// Reassembles a mode from its storage columns.
    ///
    /// # Errors
    ///
    /// Returns [`ParseAssignmentModeError`] for an unknown kind string.
    pub fn from_storage(
        kind: &str,
        include_coordinators: bool,
    ) -> Result<Self, ParseAssignmentModeError> {
        match kind {
            "whole_team" => Ok(Self::WholeTeam {
                include_coordinators,
            }),
            "specific_people" => Ok(Self::SpecificPeople),
            _ => Err(ParseAssignmentModeError(kind.to_owned())),
        }
    }

    /// Returns whether the mode assigns the whole team.
    #[must_use]
    pub const fn is_whole_team(self) -> bool {
        matches!(self, Self::WholeTeam { .. })
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Low priority.
    Low,
    /// Default priority.
    Normal,
    /// High priority.
    High,
}

impl Priority {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }
}

impl TryFrom<&str> for Priority {
    type Error = ParsePriorityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            _ => Err(ParsePriorityError(value.to_owned())),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task-level lifecycle, independent of per-user execution states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskLifecycle {
    /// Open for work.
    Active,
    /// Globally closed by an administrative action.
    Closed,
}

impl TaskLifecycle {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Closed => "closed",
        }
    }
}

impl TryFrom<&str> for TaskLifecycle {
    type Error = ParseTaskLifecycleError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "active" => Ok(Self::Active),
            "closed" => Ok(Self::Closed),
            _ => Err(ParseTaskLifecycleError(value.to_owned())),
        }
    }
}

impl fmt::Display for TaskLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File reference attached to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Original file name.
    pub file_name: String,
    /// Location of the stored file.
    pub url: String,
}

/// Roster entry used to materialize whole-team executions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamMember {
    /// Member identifier.
    pub user_id: UserId,
    /// Member display name.
    pub name: String,
    /// Member role within the team.
    pub role: Role,
}

impl TeamMember {
    /// Returns whether the member receives a whole-team execution.
    #[must_use]
    pub const fn qualifies(&self, include_coordinators: bool) -> bool {
        match self.role {
            Role::Participant => true,
            Role::Coordinator => include_coordinators,
            Role::Administrator | Role::Director => false,
        }
    }
}

/// Explicitly named assignee for specific-people tasks or manual adds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignee {
    /// Assignee identifier.
    pub user_id: UserId,
    /// Assignee display name.
    pub name: String,
}

/// Validated input for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    /// Team placement.
    pub scope: TaskScope,
    /// Responsibility distribution mode.
    pub assignment: AssignmentMode,
    /// Task title.
    pub title: TaskTitle,
    /// Task description.
    pub description: String,
    /// Optional deadline.
    pub deadline: Option<DateTime<Utc>>,
    /// Priority.
    pub priority: Priority,
    /// Creating user.
    pub creator_id: UserId,
    /// Creating user's display name.
    pub creator_name: String,
    /// Whether administrators see the task without involvement.
    pub visible_to_admin: bool,
    /// Attached file references.
    pub attachments: Vec<Attachment>,
}

/// Field updates applied by a task edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskEdits {
    /// New title, if changed.
    pub title: Option<TaskTitle>,
    /// New description, if changed.
    pub description: Option<String>,
    /// New deadline (`Some(None)` clears it).
    pub deadline: Option<Option<DateTime<Utc>>>,
    /// New priority, if changed.
    pub priority: Option<Priority>,
}

/// How an execution removal was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// The execution row persists as `Removed` to preserve archive history.
    SoftRemoved,
    /// The execution, its submissions, and its assignment link are gone.
    HardRemoved,
}

/// Task aggregate root.
///
/// Owns the per-user executions, the append-only submission log (newest
/// first), and the explicit assignment links; all execution status
/// transitions go through its methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    scope: TaskScope,
    assignment: AssignmentMode,
    title: TaskTitle,
    description: String,
    deadline: Option<DateTime<Utc>>,
    priority: Priority,
    creator_id: UserId,
    creator_name: String,
    lifecycle: TaskLifecycle,
    visible_to_admin: bool,
    attachments: Vec<Attachment>,
    executions: Vec<TaskExecution>,
    submissions: Vec<TaskSubmission>,
    assignments: Vec<UserId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted team placement.
    pub scope: TaskScope,
    /// Persisted assignment mode.
    pub assignment: AssignmentMode,
    /// Persisted title.
    pub title: TaskTitle,
    /// Persisted description.
    pub description: String,
    /// Persisted deadline, if any.
    pub deadline: Option<DateTime<Utc>>,
    /// Persisted priority.
    pub priority: Priority,
    /// Persisted creator identifier.
    pub creator_id: UserId,
    /// Persisted creator display name.
    pub creator_name: String,
    /// Persisted lifecycle.
    pub lifecycle: TaskLifecycle,
    /// Persisted administrator-visibility flag.
    pub visible_to_admin: bool,
    /// Persisted attachments.
    pub attachments: Vec<Attachment>,
    /// Persisted executions.
    pub executions: Vec<TaskExecution>,
    /// Persisted submissions, newest first.
    pub submissions: Vec<TaskSubmission>,
    /// Persisted assignment links.
    pub assignments: Vec<UserId>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest change timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a task and materializes its initial executions.
    ///
    /// Whole-team mode creates one `Active` execution per qualifying
    /// roster member (participants, plus coordinators when the mode says
    /// so). Specific-people mode creates an execution and an assignment
    /// link per listed assignee.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NoAssignees`] when specific-people mode
    /// is requested without assignees.
    pub fn create(
        draft: TaskDraft,
        roster: &[TeamMember],
        assignees: &[Assignee],
        clock: &impl Clock,
    ) -> Result<Self, TaskDomainError> {
        let timestamp = clock.utc();
        let mut executions = Vec::new();
        let mut assignments = Vec::new();

        match draft.assignment {
            AssignmentMode::WholeTeam {
                include_coordinators,
            } => {
                for member in roster
                    .iter()
                    .filter(|member| member.qualifies(include_coordinators))
                {
                    executions.push(TaskExecution::assigned(
                        member.user_id,
                        member.name.clone(),
                        clock,
                    ));
                }
            }
            AssignmentMode::SpecificPeople => {
                if assignees.is_empty() {
                    return Err(TaskDomainError::NoAssignees);
                }
                for assignee in assignees {
                    if assignments.contains(&assignee.user_id) {
                        continue;
                    }
                    assignments.push(assignee.user_id);
                    executions.push(TaskExecution::assigned(
                        assignee.user_id,
                        assignee.name.clone(),
                        clock,
                    ));
                }
            }
        }

        Ok(Self {
            id: TaskId::new(),
            scope: draft.scope,
            assignment: draft.assignment,
            title: draft.title,
            description: draft.description,
            deadline: draft.deadline,
            priority: draft.priority,
            creator_id: draft.creator_id,
            creator_name: draft.creator_name,
            lifecycle: TaskLifecycle::Active,
            visible_to_admin: draft.visible_to_admin,
            attachments: draft.attachments,
            executions,
            submissions: Vec::new(),
            assignments,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            scope: data.scope,
            assignment: data.assignment,
            title: data.title,
            description: data.description,
            deadline: data.deadline,
            priority: data.priority,
            creator_id: data.creator_id,
            creator_name: data.creator_name,
            lifecycle: data.lifecycle,
            visible_to_admin: data.visible_to_admin,
            attachments: data.attachments,
            executions: data.executions,
            submissions: data.submissions,
            assignments: data.assignments,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the team placement.
    #[must_use]
    pub const fn scope(&self) -> TaskScope {
        self.scope
    }

    /// Returns the assignment mode.
    #[must_use]
    pub const fn assignment(&self) -> AssignmentMode {
        self.assignment
    }

    /// Returns the title.
    #[must_use]
    pub const fn title(&self) -> &TaskTitle {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the creating user's identifier.
    #[must_use]
    pub const fn creator_id(&self) -> UserId {
        self.creator_id
    }

    /// Returns the creating user's display name.
    #[must_use]
    pub fn creator_name(&self) -> &str {
        &self.creator_name
    }

    /// Returns the task-level lifecycle.
    #[must_use]
    pub const fn lifecycle(&self) -> TaskLifecycle {
        self.lifecycle
    }

    /// Returns whether administrators see the task without involvement.
    #[must_use]
    pub const fn visible_to_admin(&self) -> bool {
        self.visible_to_admin
    }

    /// Returns the attached file references.
    #[must_use]
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Returns all executions.
    #[must_use]
    pub fn executions(&self) -> &[TaskExecution] {
        &self.executions
    }

    /// Returns the execution for the given user, if any.
    #[must_use]
    pub fn execution(&self, user_id: UserId) -> Option<&TaskExecution> {
        self.executions
            .iter()
            .find(|execution| execution.user_id() == user_id)
    }

    /// Returns the submission log, newest first.
    #[must_use]
    pub fn submissions(&self) -> &[TaskSubmission] {
        &self.submissions
    }

    /// Returns the explicit assignment links.
    #[must_use]
    pub fn assignments(&self) -> &[UserId] {
        &self.assignments
    }

    /// Returns whether the user is explicitly assigned.
    #[must_use]
    pub fn is_assigned(&self, user_id: UserId) -> bool {
        self.assignments.contains(&user_id)
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest change timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns whether the user is involved with this task as creator,
    /// assignee, or executor.
    #[must_use]
    pub fn involves(&self, user_id: UserId) -> bool {
        self.creator_id == user_id
            || self.is_assigned(user_id)
            || self.execution(user_id).is_some()
    }

    /// Returns the operative overdue cutoff for the given user: the
    /// reviewer-set correction deadline when present, else the task
    /// deadline.
    #[must_use]
    pub fn operative_deadline(&self, user_id: UserId) -> Option<DateTime<Utc>> {
        self.execution(user_id)
            .and_then(TaskExecution::correction_deadline)
            .or(self.deadline)
    }

    /// Returns whether the user's work is overdue: the execution still
    /// awaits submission (or correction) and the operative cutoff has
    /// passed.
    #[must_use]
    pub fn is_overdue(&self, user_id: UserId, now: DateTime<Utc>) -> bool {
        let awaiting = self.execution(user_id).is_some_and(|execution| {
            matches!(
                execution.status(),
                ExecutionStatus::Active | ExecutionStatus::Rejected
            )
        });
        awaiting && self.operative_deadline(user_id).is_some_and(|cutoff| cutoff < now)
    }

    /// Applies field edits.
    pub fn edit(&mut self, edits: TaskEdits, clock: &impl Clock) {
        if let Some(title) = edits.title {
            self.title = title;
        }
        if let Some(description) = edits.description {
            self.description = description;
        }
        if let Some(deadline) = edits.deadline {
            self.deadline = deadline;
        }
        if let Some(priority) = edits.priority {
            self.priority = priority;
        }
        self.touch(clock);
    }

    /// Manually assigns a user, creating the assignment link and an
    /// `Active` execution unless they already exist.
    pub fn assign_user(&mut self, assignee: &Assignee, clock: &impl Clock) {
        if !self.assignments.contains(&assignee.user_id) {
            self.assignments.push(assignee.user_id);
        }
        if self.execution(assignee.user_id).is_none() {
            self.executions.push(TaskExecution::assigned(
                assignee.user_id,
                assignee.name.clone(),
                clock,
            ));
        }
        self.touch(clock);
    }

    /// Records submitted work for the user, upserting their execution.
    ///
    /// Creates the execution when absent. Appends an immutable submission
    /// record carrying the same text; the persisted aggregate update
    /// writes both in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidExecutionTransition`] when the
    /// execution is already `Accepted` or `Removed`.
    pub fn submit_work(
        &mut self,
        user_id: UserId,
        user_name: impl Into<String>,
        text: SubmissionText,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        let task_id = self.id;
        let name = user_name.into();
        if self.execution(user_id).is_none() {
            self.executions
                .push(TaskExecution::assigned(user_id, name.clone(), clock));
        }

        let execution = self.execution_mut(user_id)?;
        execution
            .submit(clock)
            .map_err(|refused| refused_to_error(task_id, user_id, refused))?;
        let corrected = execution.corrected();

        self.submissions
            .insert(0, TaskSubmission::new(user_id, name, text, corrected, clock));
        self.touch(clock);
        Ok(())
    }

    /// Approves the user's submitted work.
    ///
    /// Approving an already-accepted execution is an idempotent no-op.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::ExecutionNotFound`] when no execution
    /// exists for the user, or
    /// [`TaskDomainError::InvalidExecutionTransition`] when the execution
    /// is not awaiting review.
    pub fn approve_work(
        &mut self,
        user_id: UserId,
        clock: &impl Clock,
    ) -> Result<ReviewOutcome, TaskDomainError> {
        let task_id = self.id;
        let execution = self.execution_mut(user_id)?;
        let outcome = execution
            .approve(clock)
            .map_err(|refused| refused_to_error(task_id, user_id, refused))?;
        if outcome == ReviewOutcome::Approved {
            self.touch(clock);
        }
        Ok(outcome)
    }

    /// Rejects the user's submitted work with a note and an optional
    /// correction deadline. A blank note is replaced by a default message.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::ExecutionNotFound`] when no execution
    /// exists for the user, or
    /// [`TaskDomainError::InvalidExecutionTransition`] when the execution
    /// is not awaiting review.
    pub fn reject_work(
        &mut self,
        user_id: UserId,
        note: &str,
        correction_deadline: Option<DateTime<Utc>>,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        let task_id = self.id;
        let execution = self.execution_mut(user_id)?;
        execution
            .reject(note, correction_deadline, clock)
            .map_err(|refused| refused_to_error(task_id, user_id, refused))?;
        self.touch(clock);
        Ok(())
    }

    /// Closes the task globally. Individual execution states are
    /// untouched; re-closing is a no-op.
    pub fn close(&mut self, clock: &impl Clock) {
        if self.lifecycle == TaskLifecycle::Closed {
            return;
        }
        self.lifecycle = TaskLifecycle::Closed;
        self.touch(clock);
    }

    /// Removes the user's execution, respecting archive history.
    ///
    /// An archived execution is soft-deleted: its row persists as
    /// `Removed` with the folder link intact. An unarchived execution is
    /// hard-deleted together with its submissions and assignment link.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::ExecutionNotFound`] when no execution
    /// exists for the user.
    pub fn remove_execution(
        &mut self,
        user_id: UserId,
        clock: &impl Clock,
    ) -> Result<RemovalOutcome, TaskDomainError> {
        let execution = self.execution_mut(user_id)?;
        let outcome = if execution.archival().is_archived() {
            execution.soft_remove(clock);
            RemovalOutcome::SoftRemoved
        } else {
            self.executions
                .retain(|remaining| remaining.user_id() != user_id);
            self.submissions
                .retain(|submission| submission.user_id() != user_id);
            self.assignments.retain(|assigned| *assigned != user_id);
            RemovalOutcome::HardRemoved
        };
        self.touch(clock);
        Ok(outcome)
    }

    /// Places the user's execution in an archive folder.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::ExecutionNotFound`] when no execution
    /// exists for the user, or [`TaskDomainError::NotArchivable`] when the
    /// execution has not been settled by review.
    pub fn archive_execution(
        &mut self,
        user_id: UserId,
        folder_id: FolderId,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        let task_id = self.id;
        let execution = self.execution_mut(user_id)?;
        if !execution.status().is_settled() {
            return Err(TaskDomainError::NotArchivable {
                task_id,
                user_id,
                status: execution.status(),
            });
        }
        execution.set_archival(Archival::InFolder { folder_id });
        self.touch(clock);
        Ok(())
    }

    /// Unlinks the user's execution from its archive folder. The
    /// execution record itself is kept, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::ExecutionNotFound`] when no execution
    /// exists for the user.
    pub fn unarchive_execution(
        &mut self,
        user_id: UserId,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        let execution = self.execution_mut(user_id)?;
        execution.set_archival(Archival::None);
        self.touch(clock);
        Ok(())
    }

    fn execution_mut(&mut self, user_id: UserId) -> Result<&mut TaskExecution, TaskDomainError> {
        let task_id = self.id;
        self.executions
            .iter_mut()
            .find(|execution| execution.user_id() == user_id)
            .ok_or(TaskDomainError::ExecutionNotFound { task_id, user_id })
    }

    /// Updates the `updated_at` timestamp to the current clock time.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}

const fn refused_to_error(
    task_id: TaskId,
    user_id: UserId,
    refused: RefusedTransition,
) -> TaskDomainError {
    TaskDomainError::InvalidExecutionTransition {
        task_id,
        user_id,
        from: refused.from,
        to: refused.to,
    }
}
