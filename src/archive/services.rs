//! Application service for archive folder management.
//!
//! Folder CRUD and sharing live here; execution links are delegated to
//! the task workflow core through [`ExecutionArchiver`], so this module
//! never touches task persistence directly.

use crate::archive::domain::{ArchiveDomainError, ArchiveFolder, FolderName};
use crate::archive::ports::{ArchiveFolderRepository, ArchiveRepositoryError, ExecutionArchiver};
use crate::task::domain::{FolderId, Task, TaskId, UserId};
use crate::task::services::WorkflowError;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Service-level errors for archive folder operations.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Domain validation or invitation guard failed.
    #[error(transparent)]
    Domain(#[from] ArchiveDomainError),

    /// Folder repository operation failed.
    #[error(transparent)]
    Repository(#[from] ArchiveRepositoryError),

    /// The task workflow core refused an execution link operation.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// The folder does not exist.
    #[error("archive folder not found: {0}")]
    FolderNotFound(FolderId),

    /// The acting user may not perform the operation on the folder.
    #[error("user {user_id} may not {action} folder {folder_id}")]
    Forbidden {
        /// Operation that was refused.
        action: &'static str,
        /// Folder the operation targeted.
        folder_id: FolderId,
        /// Acting user.
        user_id: UserId,
    },
}

/// Result type for archive service operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Archive folder orchestration service.
#[derive(Clone)]
pub struct ArchiveService<F, A, C>
where
    F: ArchiveFolderRepository,
    A: ExecutionArchiver,
    C: Clock + Send + Sync,
{
    folders: Arc<F>,
    archiver: Arc<A>,
    clock: Arc<C>,
}

impl<F, A, C> ArchiveService<F, A, C>
where
    F: ArchiveFolderRepository,
    A: ExecutionArchiver,
    C: Clock + Send + Sync,
{
    /// Creates a new archive service.
    #[must_use]
    pub const fn new(folders: Arc<F>, archiver: Arc<A>, clock: Arc<C>) -> Self {
        Self {
            folders,
            archiver,
            clock,
        }
    }

    /// Creates a folder owned by the user. The owner's share is accepted
    /// automatically.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Domain`] when the name is empty, or
    /// [`ArchiveError::Repository`] on persistence failures.
    pub async fn create_folder(&self, name: &str, owner_id: UserId) -> ArchiveResult<ArchiveFolder> {
        let folder_name = FolderName::new(name)?;
        let folder = ArchiveFolder::new(folder_name, owner_id, &*self.clock);
        self.folders.store(&folder).await?;
        tracing::debug!(folder_id = %folder.id(), %owner_id, "archive folder created");
        Ok(folder)
    }

    /// Renames the folder. Only the owner may rename.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Forbidden`] for non-owners,
    /// [`ArchiveError::Domain`] when the name is empty, or
    /// [`ArchiveError::FolderNotFound`] when the folder does not exist.
    pub async fn rename_folder(
        &self,
        folder_id: FolderId,
        actor_id: UserId,
        name: &str,
    ) -> ArchiveResult<ArchiveFolder> {
        let folder_name = FolderName::new(name)?;
        let mut folder = self.load(folder_id).await?;
        ensure_owner(&folder, actor_id, "rename")?;
        folder.rename(folder_name, &*self.clock);
        self.folders.update(&folder).await?;
        Ok(folder)
    }

    /// Invites a user to the folder, creating a pending share. Only the
    /// owner may invite.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Forbidden`] for non-owners,
    /// [`ArchiveError::Domain`] when the user already holds a share, or
    /// [`ArchiveError::FolderNotFound`] when the folder does not exist.
    pub async fn invite(
        &self,
        folder_id: FolderId,
        actor_id: UserId,
        invitee_id: UserId,
    ) -> ArchiveResult<ArchiveFolder> {
        let mut folder = self.load(folder_id).await?;
        ensure_owner(&folder, actor_id, "share")?;
        folder.invite(invitee_id, &*self.clock)?;
        self.folders.update(&folder).await?;
        tracing::debug!(%folder_id, %invitee_id, "folder invitation sent");
        Ok(folder)
    }

    /// Accepts the user's pending invitation to the folder.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Domain`] when the user holds no share, or
    /// [`ArchiveError::FolderNotFound`] when the folder does not exist.
    pub async fn accept_invitation(
        &self,
        folder_id: FolderId,
        user_id: UserId,
    ) -> ArchiveResult<ArchiveFolder> {
        let mut folder = self.load(folder_id).await?;
        folder.accept_invitation(user_id, &*self.clock)?;
        self.folders.update(&folder).await?;
        tracing::debug!(%folder_id, %user_id, "folder invitation accepted");
        Ok(folder)
    }

    /// Returns every folder the user holds a share of, pending
    /// invitations included, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Repository`] when the query fails.
    pub async fn folders_for_user(&self, user_id: UserId) -> ArchiveResult<Vec<ArchiveFolder>> {
        Ok(self.folders.list_for_user(user_id).await?)
    }

    /// Returns the tasks holding executions archived in the folder.
    /// Requires an accepted share.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Forbidden`] when the user's share is
    /// missing or still pending, or [`ArchiveError::FolderNotFound`] when
    /// the folder does not exist.
    pub async fn folder_contents(
        &self,
        folder_id: FolderId,
        user_id: UserId,
    ) -> ArchiveResult<Vec<Task>> {
        let folder = self.load(folder_id).await?;
        ensure_viewer(&folder, user_id)?;
        Ok(self.archiver.folder_tasks(folder_id).await?)
    }

    /// Places a settled execution in the folder. The acting user needs an
    /// accepted share of the folder.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Forbidden`] when the user's share is
    /// missing or still pending, [`ArchiveError::FolderNotFound`] when the
    /// folder does not exist, or [`ArchiveError::Workflow`] when the
    /// execution is missing or not settled.
    pub async fn archive_execution(
        &self,
        folder_id: FolderId,
        actor_id: UserId,
        task_id: TaskId,
        executor_id: UserId,
    ) -> ArchiveResult<()> {
        let folder = self.load(folder_id).await?;
        ensure_viewer(&folder, actor_id)?;
        self.archiver
            .mark_archived(task_id, executor_id, folder_id)
            .await?;
        tracing::debug!(%folder_id, %task_id, %executor_id, "execution archived");
        Ok(())
    }

    /// Unlinks an execution from its folder.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Workflow`] when the execution is missing or
    /// persistence fails.
    pub async fn unarchive_execution(
        &self,
        task_id: TaskId,
        executor_id: UserId,
    ) -> ArchiveResult<()> {
        self.archiver.mark_unarchived(task_id, executor_id).await?;
        Ok(())
    }

    /// Deletes the folder and its shares, unlinking every execution that
    /// referenced it first. Execution records survive. Only the owner may
    /// delete.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Forbidden`] for non-owners,
    /// [`ArchiveError::FolderNotFound`] when the folder does not exist, or
    /// [`ArchiveError::Workflow`] when unlinking fails.
    pub async fn delete_folder(&self, folder_id: FolderId, actor_id: UserId) -> ArchiveResult<()> {
        let folder = self.load(folder_id).await?;
        ensure_owner(&folder, actor_id, "delete")?;
        self.archiver.release_folder(folder_id).await?;
        self.folders.delete(folder_id).await?;
        tracing::debug!(%folder_id, "archive folder deleted");
        Ok(())
    }

    async fn load(&self, folder_id: FolderId) -> ArchiveResult<ArchiveFolder> {
        match self.folders.find_by_id(folder_id).await {
            Ok(Some(folder)) => Ok(folder),
            Ok(None) => Err(ArchiveError::FolderNotFound(folder_id)),
            Err(ArchiveRepositoryError::NotFound(missing)) => {
                Err(ArchiveError::FolderNotFound(missing))
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn ensure_owner(
    folder: &ArchiveFolder,
    actor_id: UserId,
    action: &'static str,
) -> ArchiveResult<()> {
    if folder.is_owner(actor_id) {
        Ok(())
    } else {
        Err(ArchiveError::Forbidden {
            action,
            folder_id: folder.id(),
            user_id: actor_id,
        })
    }
}

fn ensure_viewer(folder: &ArchiveFolder, user_id: UserId) -> ArchiveResult<()> {
    if folder.can_view(user_id) {
        Ok(())
    } else {
        Err(ArchiveError::Forbidden {
            action: "view",
            folder_id: folder.id(),
            user_id,
        })
    }
}
