//! Service layer orchestrating task creation, queries, and status
//! transitions.
//!
//! Every mutation loads the aggregate, applies the guarded domain
//! transition, and persists the whole aggregate in one atomic repository
//! update, so the submission log and the execution status can never drift
//! apart.

use crate::task::{
    domain::{
        Assignee, AssignmentMode, Attachment, FolderId, Priority, RemovalOutcome, Requester,
        ReviewOutcome, Role, SubmissionText, Task, TaskDomainError, TaskDraft, TaskEdits,
        TaskFilter, TaskId, TaskScope, TaskTitle, TeamId, TeamMember, UserId,
    },
    ports::{TaskRepository, TaskRepositoryError},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    title: String,
    description: String,
    scope: TaskScope,
    assignment: AssignmentMode,
    deadline: Option<DateTime<Utc>>,
    priority: Priority,
    creator_id: UserId,
    creator_name: String,
    visible_to_admin: bool,
    attachments: Vec<Attachment>,
    roster: Vec<TeamMember>,
    assignees: Vec<Assignee>,
}

impl CreateTaskRequest {
    /// Creates a request with required fields. Defaults to a global,
    /// whole-team (participants only), normal-priority task.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        creator_id: UserId,
        creator_name: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            scope: TaskScope::Global,
            assignment: AssignmentMode::WholeTeam {
                include_coordinators: false,
            },
            deadline: None,
            priority: Priority::Normal,
            creator_id,
            creator_name: creator_name.into(),
            visible_to_admin: false,
            attachments: Vec::new(),
            roster: Vec::new(),
            assignees: Vec::new(),
        }
    }

    /// Scopes the task to one team.
    #[must_use]
    pub const fn with_team(mut self, team_id: TeamId) -> Self {
        self.scope = TaskScope::Team { team_id };
        self
    }

    /// Assigns the whole team, optionally including coordinators.
    #[must_use]
    pub const fn with_whole_team(mut self, include_coordinators: bool) -> Self {
        self.assignment = AssignmentMode::WholeTeam {
            include_coordinators,
        };
        self
    }

    /// Assigns only the listed people.
    #[must_use]
    pub fn with_specific_people(mut self, assignees: impl IntoIterator<Item = Assignee>) -> Self {
        self.assignment = AssignmentMode::SpecificPeople;
        self.assignees = assignees.into_iter().collect();
        self
    }

    /// Supplies the team roster used to materialize whole-team executions.
    #[must_use]
    pub fn with_roster(mut self, roster: impl IntoIterator<Item = TeamMember>) -> Self {
        self.roster = roster.into_iter().collect();
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Flags the task as visible to administrators without involvement.
    #[must_use]
    pub const fn visible_to_admin(mut self) -> Self {
        self.visible_to_admin = true;
        self
    }

    /// Attaches file references.
    #[must_use]
    pub fn with_attachments(mut self, attachments: impl IntoIterator<Item = Attachment>) -> Self {
        self.attachments = attachments.into_iter().collect();
        self
    }
}

/// Service-level errors for task workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Domain validation or transition guard failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),

    /// The task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The acting role may not perform the operation.
    #[error("role {role} may not {action}")]
    Forbidden {
        /// Operation that was refused.
        action: &'static str,
        /// Role of the acting requester.
        role: Role,
    },
}

/// Result type for task workflow service operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Task workflow orchestration service.
#[derive(Clone)]
pub struct TaskWorkflowService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> TaskWorkflowService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new task workflow service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Creates a task and materializes its initial executions.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when input validation fails or the
    /// repository rejects persistence.
    pub async fn create_task(&self, request: CreateTaskRequest) -> WorkflowResult<Task> {
        let draft = TaskDraft {
            scope: request.scope,
            assignment: request.assignment,
            title: TaskTitle::new(request.title)?,
            description: request.description,
            deadline: request.deadline,
            priority: request.priority,
            creator_id: request.creator_id,
            creator_name: request.creator_name,
            visible_to_admin: request.visible_to_admin,
            attachments: request.attachments,
        };
        let task = Task::create(draft, &request.roster, &request.assignees, &*self.clock)?;
        self.repository.store(&task).await?;
        tracing::debug!(
            task_id = %task.id(),
            executions = task.executions().len(),
            "created task"
        );
        Ok(task)
    }

    /// Returns the tasks visible under the filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Repository`] when the query fails.
    pub async fn get_tasks(&self, filter: &TaskFilter) -> WorkflowResult<Vec<Task>> {
        Ok(self.repository.query(filter).await?)
    }

    /// Retrieves a task by identifier.
    ///
    /// Returns `Ok(None)` when no such task exists.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Repository`] when the lookup fails.
    pub async fn find_task(&self, task_id: TaskId) -> WorkflowResult<Option<Task>> {
        Ok(self.repository.find_by_id(task_id).await?)
    }

    /// Records submitted work, upserting the user's execution and
    /// appending a submission log entry in one atomic update.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the text is empty, the task does not
    /// exist, or the execution refuses the transition.
    pub async fn submit_work(
        &self,
        task_id: TaskId,
        user_id: UserId,
        user_name: impl Into<String> + Send,
        text: &str,
    ) -> WorkflowResult<Task> {
        let submission_text = SubmissionText::new(text)?;
        let mut task = self.load(task_id).await?;
        task.submit_work(user_id, user_name, submission_text, &*self.clock)?;
        self.repository.update(&task).await?;
        tracing::debug!(%task_id, %user_id, "work submitted");
        Ok(task)
    }

    /// Approves the user's submitted work. Requires a reviewer role.
    ///
    /// Approving an already-accepted execution succeeds without change.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Forbidden`] for participant actors,
    /// [`WorkflowError::Domain`] when the execution is missing or not
    /// reviewable, or [`WorkflowError::Repository`] on persistence
    /// failures.
    pub async fn approve_work(
        &self,
        task_id: TaskId,
        user_id: UserId,
        actor: &Requester,
    ) -> WorkflowResult<Task> {
        ensure_reviewer(actor, "approve work")?;
        let mut task = self.load(task_id).await?;
        let outcome = task.approve_work(user_id, &*self.clock)?;
        if outcome == ReviewOutcome::Approved {
            self.repository.update(&task).await?;
        }
        tracing::debug!(%task_id, %user_id, ?outcome, "work approved");
        Ok(task)
    }

    /// Rejects the user's submitted work with a note and an optional
    /// correction deadline. Requires a reviewer role.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Forbidden`] for participant actors,
    /// [`WorkflowError::Domain`] when the execution is missing or not
    /// reviewable, or [`WorkflowError::Repository`] on persistence
    /// failures.
    pub async fn reject_work(
        &self,
        task_id: TaskId,
        user_id: UserId,
        note: &str,
        correction_deadline: Option<DateTime<Utc>>,
        actor: &Requester,
    ) -> WorkflowResult<Task> {
        ensure_reviewer(actor, "reject work")?;
        let mut task = self.load(task_id).await?;
        task.reject_work(user_id, note, correction_deadline, &*self.clock)?;
        self.repository.update(&task).await?;
        tracing::debug!(%task_id, %user_id, "work rejected");
        Ok(task)
    }

    /// Closes the task globally, leaving execution states untouched.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::TaskNotFound`] when the task does not
    /// exist, or [`WorkflowError::Repository`] on persistence failures.
    pub async fn close_task(&self, task_id: TaskId) -> WorkflowResult<Task> {
        let mut task = self.load(task_id).await?;
        task.close(&*self.clock);
        self.repository.update(&task).await?;
        tracing::debug!(%task_id, "task closed");
        Ok(task)
    }

    /// Applies field edits to the task.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::TaskNotFound`] when the task does not
    /// exist, or [`WorkflowError::Repository`] on persistence failures.
    pub async fn edit_task(&self, task_id: TaskId, edits: TaskEdits) -> WorkflowResult<Task> {
        let mut task = self.load(task_id).await?;
        task.edit(edits, &*self.clock);
        self.repository.update(&task).await?;
        Ok(task)
    }

    /// Manually assigns a user to the task.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::TaskNotFound`] when the task does not
    /// exist, or [`WorkflowError::Repository`] on persistence failures.
    pub async fn assign_user(&self, task_id: TaskId, assignee: &Assignee) -> WorkflowResult<Task> {
        let mut task = self.load(task_id).await?;
        task.assign_user(assignee, &*self.clock);
        self.repository.update(&task).await?;
        Ok(task)
    }

    /// Removes the user's execution, soft-deleting when it belongs to an
    /// archive folder and hard-deleting (with submissions and assignment
    /// link) otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Domain`] when the execution is missing, or
    /// [`WorkflowError::Repository`] on persistence failures.
    pub async fn delete_execution(
        &self,
        task_id: TaskId,
        user_id: UserId,
    ) -> WorkflowResult<Task> {
        let mut task = self.load(task_id).await?;
        let outcome = task.remove_execution(user_id, &*self.clock)?;
        self.repository.update(&task).await?;
        if outcome == RemovalOutcome::SoftRemoved {
            tracing::debug!(%task_id, %user_id, "execution soft-removed for archive history");
        } else {
            tracing::debug!(%task_id, %user_id, "execution hard-removed");
        }
        Ok(task)
    }

    /// Deletes the task, cascading to executions, submissions, and
    /// assignment links.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Repository`] when the task does not exist
    /// or persistence fails.
    pub async fn delete_task(&self, task_id: TaskId) -> WorkflowResult<()> {
        self.repository.delete(task_id).await?;
        tracing::debug!(%task_id, "task deleted");
        Ok(())
    }

    /// Places a settled execution in an archive folder.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Domain`] when the execution is missing or
    /// not settled, or [`WorkflowError::Repository`] on persistence
    /// failures.
    pub async fn archive_execution(
        &self,
        task_id: TaskId,
        user_id: UserId,
        folder_id: FolderId,
    ) -> WorkflowResult<Task> {
        let mut task = self.load(task_id).await?;
        task.archive_execution(user_id, folder_id, &*self.clock)?;
        self.repository.update(&task).await?;
        Ok(task)
    }

    /// Unlinks an execution from its archive folder.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Domain`] when the execution is missing, or
    /// [`WorkflowError::Repository`] on persistence failures.
    pub async fn unarchive_execution(
        &self,
        task_id: TaskId,
        user_id: UserId,
    ) -> WorkflowResult<Task> {
        let mut task = self.load(task_id).await?;
        task.unarchive_execution(user_id, &*self.clock)?;
        self.repository.update(&task).await?;
        Ok(task)
    }

    /// Returns the tasks holding executions linked to the folder.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Repository`] when the lookup fails.
    pub async fn tasks_in_folder(&self, folder_id: FolderId) -> WorkflowResult<Vec<Task>> {
        Ok(self.repository.find_by_folder(folder_id).await?)
    }

    /// Unlinks every execution referencing the folder, used when the
    /// folder is deleted. Execution records are kept.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Repository`] on persistence failures.
    pub async fn unlink_folder(&self, folder_id: FolderId) -> WorkflowResult<()> {
        let affected = self.repository.find_by_folder(folder_id).await?;
        for mut task in affected {
            let linked: Vec<UserId> = task
                .executions()
                .iter()
                .filter(|execution| execution.archival().folder_id() == Some(folder_id))
                .map(|execution| execution.user_id())
                .collect();
            for user_id in linked {
                task.unarchive_execution(user_id, &*self.clock)?;
            }
            self.repository.update(&task).await?;
        }
        tracing::debug!(%folder_id, "archive folder unlinked from executions");
        Ok(())
    }

    async fn load(&self, task_id: TaskId) -> WorkflowResult<Task> {
        match self.repository.find_by_id(task_id).await {
            Ok(Some(task)) => Ok(task),
            Ok(None) => Err(WorkflowError::TaskNotFound(task_id)),
            Err(TaskRepositoryError::NotFound(missing)) => {
                Err(WorkflowError::TaskNotFound(missing))
            }
            Err(err) => Err(err.into()),
        }
    }
}

const fn ensure_reviewer(actor: &Requester, action: &'static str) -> WorkflowResult<()> {
    if actor.role.is_reviewer() {
        Ok(())
    } else {
        Err(WorkflowError::Forbidden {
            action,
            role: actor.role,
        })
    }
}
