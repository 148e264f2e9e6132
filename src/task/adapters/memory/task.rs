//! In-memory task repository.
//!
//! Serves as the reference implementation of the repository contract: the
//! query path applies the pure domain visibility predicate, which the
//! `PostgreSQL` adapter mirrors in SQL.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::{FolderId, Task, TaskFilter, TaskId, is_task_visible},
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};

/// Thread-safe in-memory task repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<HashMap<TaskId, Task>>>,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl ToString) -> TaskRepositoryError {
    TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

/// Newest-first ordering shared with the `PostgreSQL` adapter's
/// `ORDER BY created_at DESC`.
fn sort_newest_first(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
        state.insert(task.id(), task.clone());
        Ok(())
    }

    async fn update(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if !state.contains_key(&task.id()) {
            return Err(TaskRepositoryError::NotFound(task.id()));
        }
        // The whole aggregate is swapped under the write lock, matching
        // the transactional rewrite of the database adapter.
        state.insert(task.id(), task.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.get(&id).cloned())
    }

    async fn query(&self, filter: &TaskFilter) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut tasks: Vec<Task> = state
            .values()
            .filter(|task| is_task_visible(task, filter))
            .cloned()
            .collect();
        drop(state);
        sort_newest_first(&mut tasks);
        Ok(tasks)
    }

    async fn find_by_folder(&self, folder_id: FolderId) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut tasks: Vec<Task> = state
            .values()
            .filter(|task| {
                task.executions()
                    .iter()
                    .any(|execution| execution.archival().folder_id() == Some(folder_id))
            })
            .cloned()
            .collect();
        drop(state);
        sort_newest_first(&mut tasks);
        Ok(tasks)
    }

    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.remove(&id).is_none() {
            return Err(TaskRepositoryError::NotFound(id));
        }
        Ok(())
    }
}
