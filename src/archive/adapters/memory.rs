//! In-memory archive folder repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::archive::domain::ArchiveFolder;
use crate::archive::ports::{
    ArchiveFolderRepository, ArchiveRepositoryError, ArchiveRepositoryResult,
};
use crate::task::domain::{FolderId, UserId};

/// Thread-safe in-memory archive folder repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryArchiveFolderRepository {
    state: Arc<RwLock<HashMap<FolderId, ArchiveFolder>>>,
}

impl InMemoryArchiveFolderRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl ToString) -> ArchiveRepositoryError {
    ArchiveRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl ArchiveFolderRepository for InMemoryArchiveFolderRepository {
    async fn store(&self, folder: &ArchiveFolder) -> ArchiveRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.contains_key(&folder.id()) {
            return Err(ArchiveRepositoryError::DuplicateFolder(folder.id()));
        }
        state.insert(folder.id(), folder.clone());
        Ok(())
    }

    async fn update(&self, folder: &ArchiveFolder) -> ArchiveRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if !state.contains_key(&folder.id()) {
            return Err(ArchiveRepositoryError::NotFound(folder.id()));
        }
        state.insert(folder.id(), folder.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: FolderId) -> ArchiveRepositoryResult<Option<ArchiveFolder>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.get(&id).cloned())
    }

    async fn list_for_user(&self, user_id: UserId) -> ArchiveRepositoryResult<Vec<ArchiveFolder>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut folders: Vec<ArchiveFolder> = state
            .values()
            .filter(|folder| folder.is_shared_with(user_id))
            .cloned()
            .collect();
        drop(state);
        folders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(folders)
    }

    async fn delete(&self, id: FolderId) -> ArchiveRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.remove(&id).is_none() {
            return Err(ArchiveRepositoryError::NotFound(id));
        }
        Ok(())
    }
}
