use log::debug;
use shared::models::task::{Task, TaskRequest, TaskUpdate, TaskValidationError};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskStoreError {
    #[error("Task not found")]
    NotFound,
    #[error(transparent)]
    Validation(#[from] TaskValidationError),
}

/// In-memory task collection, kept in insertion order.
///
/// Every lookup is scoped by owner: a task that belongs to someone else is
/// reported as [`TaskStoreError::NotFound`], exactly like a missing id.
#[derive(Default)]
pub struct TaskStore {
    tasks: Mutex<Vec<Task>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Each operation is a single step on the vector, so a panic elsewhere
    // cannot leave it half-written and a poisoned lock is safe to reuse.
    fn tasks(&self) -> MutexGuard<'_, Vec<Task>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get_user_tasks(&self, user_id: &str) -> Vec<Task> {
        self.tasks()
            .iter()
            .filter(|task| task.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn get_task(&self, user_id: &str, id: &str) -> Result<Task, TaskStoreError> {
        self.tasks()
            .iter()
            .find(|task| task.id == id && task.user_id == user_id)
            .cloned()
            .ok_or(TaskStoreError::NotFound)
    }

    pub fn add_task(&self, user_id: &str, request: TaskRequest) -> Result<Task, TaskStoreError> {
        let task = Task::create(user_id, request)?;
        let mut tasks = self.tasks();
        tasks.push(task.clone());
        debug!("Stored task {} ({} tasks in store)", task.id, tasks.len());
        Ok(task)
    }

    pub fn update_task(
        &self,
        user_id: &str,
        id: &str,
        update: TaskUpdate,
    ) -> Result<Task, TaskStoreError> {
        let mut tasks = self.tasks();
        let task = tasks
            .iter_mut()
            .find(|task| task.id == id && task.user_id == user_id)
            .ok_or(TaskStoreError::NotFound)?;
        task.apply(update)?;
        Ok(task.clone())
    }

    pub fn delete_task(&self, user_id: &str, id: &str) -> Result<(), TaskStoreError> {
        let mut tasks = self.tasks();
        let index = tasks
            .iter()
            .position(|task| task.id == id && task.user_id == user_id)
            .ok_or(TaskStoreError::NotFound)?;
        tasks.remove(index);
        Ok(())
    }

    pub fn task_count(&self) -> usize {
        self.tasks().len()
    }
}
