//! Repository port for task persistence, lookup, and role-scoped queries.

use crate::task::domain::{FolderId, Task, TaskFilter, TaskId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Task persistence contract.
///
/// The repository persists whole aggregates: an `update` rewrites the task
/// row together with its executions, submissions, and assignment links in
/// one atomic step, so a status transition and its submission log entry
/// can never be split by a crash.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task ID
    /// already exists.
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Atomically persists changes to an existing task aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not
    /// exist.
    async fn update(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Returns the tasks visible under the filter, newest first.
    async fn query(&self, filter: &TaskFilter) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns all tasks holding an execution linked to the given archive
    /// folder.
    async fn find_by_folder(&self, folder_id: FolderId) -> TaskRepositoryResult<Vec<Task>>;

    /// Deletes a task, cascading to its executions, submissions, and
    /// assignment links.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not
    /// exist.
    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<()>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
