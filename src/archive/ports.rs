//! Port contracts for the archive folder collaborator.

use crate::archive::domain::ArchiveFolder;
use crate::task::domain::{FolderId, Task, TaskId, UserId};
use crate::task::ports::TaskRepository;
use crate::task::services::{TaskWorkflowService, WorkflowResult};
use async_trait::async_trait;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Result type for archive folder repository operations.
pub type ArchiveRepositoryResult<T> = Result<T, ArchiveRepositoryError>;

/// Archive folder persistence contract.
#[async_trait]
pub trait ArchiveFolderRepository: Send + Sync {
    /// Stores a new folder.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveRepositoryError::DuplicateFolder`] when the folder
    /// ID already exists.
    async fn store(&self, folder: &ArchiveFolder) -> ArchiveRepositoryResult<()>;

    /// Persists changes to an existing folder (name, shares).
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveRepositoryError::NotFound`] when the folder does
    /// not exist.
    async fn update(&self, folder: &ArchiveFolder) -> ArchiveRepositoryResult<()>;

    /// Finds a folder by identifier.
    ///
    /// Returns `None` when the folder does not exist.
    async fn find_by_id(&self, id: FolderId) -> ArchiveRepositoryResult<Option<ArchiveFolder>>;

    /// Returns every folder the user holds a share of, pending
    /// invitations included, newest first.
    async fn list_for_user(&self, user_id: UserId) -> ArchiveRepositoryResult<Vec<ArchiveFolder>>;

    /// Deletes a folder and its shares. Execution links are the caller's
    /// responsibility.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveRepositoryError::NotFound`] when the folder does
    /// not exist.
    async fn delete(&self, id: FolderId) -> ArchiveRepositoryResult<()>;
}

/// Errors returned by archive folder repository implementations.
#[derive(Debug, Clone, Error)]
pub enum ArchiveRepositoryError {
    /// A folder with the same identifier already exists.
    #[error("duplicate folder identifier: {0}")]
    DuplicateFolder(FolderId),

    /// The folder was not found.
    #[error("folder not found: {0}")]
    NotFound(FolderId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ArchiveRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

/// The task workflow core's archival contract, as seen from the archive
/// collaborator: query which tasks reference a folder, and mark
/// executions archived or unarchived.
#[async_trait]
pub trait ExecutionArchiver: Send + Sync {
    /// Marks a settled execution as archived in the folder.
    async fn mark_archived(
        &self,
        task_id: TaskId,
        user_id: UserId,
        folder_id: FolderId,
    ) -> WorkflowResult<()>;

    /// Marks an execution as unarchived.
    async fn mark_unarchived(&self, task_id: TaskId, user_id: UserId) -> WorkflowResult<()>;

    /// Returns the tasks holding executions linked to the folder.
    async fn folder_tasks(&self, folder_id: FolderId) -> WorkflowResult<Vec<Task>>;

    /// Unlinks every execution referencing the folder.
    async fn release_folder(&self, folder_id: FolderId) -> WorkflowResult<()>;
}

#[async_trait]
impl<R, C> ExecutionArchiver for TaskWorkflowService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    async fn mark_archived(
        &self,
        task_id: TaskId,
        user_id: UserId,
        folder_id: FolderId,
    ) -> WorkflowResult<()> {
        self.archive_execution(task_id, user_id, folder_id).await?;
        Ok(())
    }

    async fn mark_unarchived(&self, task_id: TaskId, user_id: UserId) -> WorkflowResult<()> {
        self.unarchive_execution(task_id, user_id).await?;
        Ok(())
    }

    async fn folder_tasks(&self, folder_id: FolderId) -> WorkflowResult<Vec<Task>> {
        self.tasks_in_folder(folder_id).await
    }

    async fn release_folder(&self, folder_id: FolderId) -> WorkflowResult<()> {
        self.unlink_folder(folder_id).await
    }
}
