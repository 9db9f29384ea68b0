use crate::store::domains::task_store::TaskStore;
use crate::store::domains::user_store::UserStore;
use std::sync::Arc;

/// Every store the API works against, built once per process.
#[derive(Default)]
pub struct StoreContext {
    pub task_store: Arc<TaskStore>,
    pub user_store: Arc<UserStore>,
}

impl StoreContext {
    pub fn new() -> Self {
        Self {
            task_store: Arc::new(TaskStore::new()),
            user_store: Arc::new(UserStore::new()),
        }
    }
}
